use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use syscohada_statements::*;

const CHART: &str = "\
Compte,Intitulé,Tableau,BD,BC,RD,RC
101.0,Capital social,Bilan,CB,CA,,
401,Fournisseurs,Bilan,BH,DJ,,
411,Clients,Bilan,BI,DI,,
521,Banque,Bilan,BS,DQ,,
601,Achats de marchandises,Résultat,,,RA,
622,Locations,Résultat,,,RH,
701,Ventes de marchandises,Résultat,,,,TA
";

const LEDGER: &str = "\
Date,Journal,AN,Compte,Libellé,Débit,Crédit,Référence
01/01/2023,AN,OUI,101,Apport initial,,2000000,
01/01/2023,AN,OUI,521,Apport initial,2000000,,
15/05/2023,AC,NON,601,Achat stock,400000,,F-001
15/05/2023,AC,NON,401,Achat stock,,400000,F-001
20/09/2023,VE,non,411,Vente,650000,,V-001
20/09/2023,VE,non,701,Vente,,650000,V-001
01/01/2024,AN,oui,101,Report capital,,2000000,
01/01/2024,AN,OUI,521,Report banque,2000000,,
10/02/2024,BQ,NON,601,Achat comptant,300000,,
10/02/2024,BQ,NON,521,Achat comptant,,300000,
2024-03-31,BQ,NON,622,Loyer mars,150000,,
2024-03-31,BQ,NON,521,Loyer mars,,150000,
18/06/2024,VE,,701,Vente comptant,,900000,
18/06/2024,VE,,521,Vente comptant,900000,,
31/13/2024,OD,NON,521,Ecriture douteuse,abc,,
";

fn loaded_session() -> Session {
    let config = ProcessingConfig::default();
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), LEDGER.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();
    session.import(&workbook).unwrap();
    session
}

#[test]
fn test_import_summary() {
    let config = ProcessingConfig::default();
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), LEDGER.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();

    let summary = match session.execute(Operation::Import(workbook)).unwrap() {
        OperationOutput::Imported(summary) => summary,
        other => panic!("unexpected output {:?}", other),
    };

    assert_eq!(summary.accounts, 7);
    assert_eq!(summary.entries, 15);
    assert_eq!(summary.fiscal_years, vec![2023, 2024]);

    let columns: Vec<&str> = summary.warnings.iter().map(|w| w.column.as_str()).collect();
    assert_eq!(columns, vec!["Date", "Débit"]);
    assert_eq!(summary.warnings[0].row, 15);

    // "101.0" in the chart matches "101" in the ledger.
    assert!(session.chart().unwrap().contains("101"));
}

#[test]
fn test_trial_balance_2024() {
    let mut session = loaded_session();
    let balance = session.trial_balance(&BalanceRequest::new(2024)).unwrap();

    assert_eq!(balance.rows.len(), 7);

    let bank = balance.row("521").unwrap();
    assert_eq!(bank.amounts.opening_debit, dec!(2000000));
    assert_eq!(bank.amounts.movement_debit, dec!(900000));
    assert_eq!(bank.amounts.movement_credit, dec!(450000));
    assert_eq!(bank.amounts.closing_debit, dec!(2450000));
    assert_eq!(bank.balance_sheet_code(), Some("BS"));

    // Lower-case "oui" is still an opening entry.
    let capital = balance.row("101").unwrap();
    assert_eq!(capital.amounts.opening_credit, dec!(2000000));
    assert_eq!(capital.amounts.movement_credit, Decimal::ZERO);
    assert_eq!(capital.balance_sheet_code(), Some("CA"));

    // 2023 activity does not leak into 2024.
    let suppliers = balance.row("401").unwrap();
    assert_eq!(suppliers.amounts, BalanceAmounts::default());
    assert_eq!(suppliers.assigned, None);

    assert_eq!(balance.totals.closing_debit, dec!(2900000));
    assert_eq!(balance.totals.closing_credit, dec!(2900000));
    assert!(balance.is_balanced());

    for row in &balance.rows {
        assert!(row.amounts.closing_debit.is_zero() || row.amounts.closing_credit.is_zero());
        assert!(!(row.balance_sheet_code().is_some() && row.result_code().is_some()));
    }
}

#[test]
fn test_comparative_statements() {
    let mut session = loaded_session();
    let statements = process_statements(&mut session, &ComparativeRequest::new(2024, 2023)).unwrap();

    let bilan = &statements.balance_sheet;
    assert_eq!(bilan.kind, StatementKind::BalanceSheet);
    assert_eq!(bilan.line("BS").unwrap().current, Some(dec!(2450000)));
    assert_eq!(bilan.line("BS").unwrap().previous, Some(dec!(2000000)));
    assert_eq!(bilan.line("BI").unwrap().current, None);
    assert_eq!(bilan.line("BI").unwrap().previous, Some(dec!(650000)));
    assert_eq!(bilan.line("DJ").unwrap().previous, Some(dec!(400000)));
    // Totals only show what mapping codes route to them.
    assert_eq!(bilan.line("BZ").unwrap().current, None);

    let resultat = &statements.income_statement;
    assert_eq!(resultat.line("RA").unwrap().current, Some(dec!(300000)));
    assert_eq!(resultat.line("RA").unwrap().previous, Some(dec!(400000)));
    assert_eq!(resultat.line("RH").unwrap().current, Some(dec!(150000)));
    assert_eq!(resultat.line("RH").unwrap().previous, None);
    assert_eq!(resultat.line("TA").unwrap().current, Some(dec!(900000)));
    assert_eq!(resultat.line("XI").unwrap().current, None);

    let markdown = statement_to_markdown(resultat);
    assert!(markdown.contains("## Charges"));
    assert!(markdown.contains("| TA | Ventes de marchandises | 900 000 | 650 000 |"));
}

#[test]
fn test_statement_requires_both_balances() {
    let mut session = loaded_session();
    session.trial_balance(&BalanceRequest::new(2024)).unwrap();

    let err = session
        .execute(Operation::IncomeStatement(ComparativeRequest::new(2024, 2023)))
        .unwrap_err();
    assert!(matches!(err, StatementError::BalanceNotComputed { year: 2023 }));
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(err.is_recoverable());
}

#[test]
fn test_different_selection_is_not_served_from_cache() {
    let mut session = loaded_session();
    let bilan_only = AccountSelection::all().with_groups(["Bilan"]);
    session
        .trial_balance(&BalanceRequest::new(2024).with_selection(bilan_only.clone()))
        .unwrap();
    session
        .trial_balance(&BalanceRequest::new(2023).with_selection(bilan_only.clone()))
        .unwrap();

    let full = ComparativeRequest::new(2024, 2023);
    assert!(matches!(
        session.balance_sheet(&full),
        Err(StatementError::BalanceNotComputed { year: 2024 })
    ));

    let statement = session
        .balance_sheet(&full.clone().with_selection(bilan_only))
        .unwrap();
    assert_eq!(statement.line("CA").unwrap().current, Some(dec!(2000000)));
}

#[test]
fn test_year_source_is_part_of_the_cache_key() -> anyhow::Result<()> {
    let config = ProcessingConfig::default();
    let ledger = "\
Date,Journal,AN,Compte,Libellé,Débit,Crédit,Exercice
28/12/2023,VE,NON,701,Vente,,500,2024
02/01/2024,VE,NON,701,Vente,,200,2024
";
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), ledger.as_bytes())?;
    let mut session = Session::new(config)?;
    session.import(&workbook)?;

    let by_exercise = YearColumn::Named("Exercice".to_string());
    session.trial_balance(&BalanceRequest::new(2024))?;
    session.trial_balance(&BalanceRequest::new(2023))?;
    let named = session.trial_balance(&BalanceRequest::new(2024).with_year_column(by_exercise.clone()))?;
    assert_eq!(named.row("701").unwrap().amounts.closing_credit, dec!(700));
    assert_eq!(session.cache().len(), 3);

    // The balance by Exercice did not replace the one by date.
    let by_date = session.income_statement(&ComparativeRequest::new(2024, 2023))?;
    assert_eq!(by_date.line("TA").unwrap().current, Some(dec!(200)));
    assert_eq!(by_date.line("TA").unwrap().previous, Some(dec!(500)));

    let named_request = ComparativeRequest::new(2024, 2023).with_year_column(by_exercise.clone());
    assert!(matches!(
        session.income_statement(&named_request),
        Err(StatementError::BalanceNotComputed { year: 2023 })
    ));

    session.trial_balance(&BalanceRequest::new(2023).with_year_column(by_exercise))?;
    let named_statement = session.income_statement(&named_request)?;
    assert_eq!(named_statement.line("TA").unwrap().current, Some(dec!(700)));
    assert_eq!(named_statement.line("TA").unwrap().previous, None);

    // Producing statements by Exercice keeps the by-date balances intact.
    let statements = process_statements(&mut session, &named_request)?;
    assert_eq!(statements.income_statement.line("TA").unwrap().current, Some(dec!(700)));
    let by_date = session.income_statement(&ComparativeRequest::new(2024, 2023))?;
    assert_eq!(by_date.line("TA").unwrap().current, Some(dec!(200)));
    Ok(())
}

#[test]
fn test_amount_overflow_is_a_data_error() {
    let config = ProcessingConfig::default();
    let ledger = "\
Date,Journal,AN,Compte,Libellé,Débit,Crédit
10/03/2024,VE,NON,701,Vente,,50000000000000000000000000000
11/03/2024,VE,NON,701,Vente,,50000000000000000000000000000
";
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), ledger.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();
    session.import(&workbook).unwrap();

    let err = session.trial_balance(&BalanceRequest::new(2024)).unwrap_err();
    assert!(matches!(err, StatementError::AmountOverflow { ref scope } if scope == "account 701"));
    assert_eq!(err.kind(), ErrorKind::Data);
    assert!(!err.is_recoverable());
    assert!(session.cache().is_empty());

    let err = session.ledger_view(&LedgerFilter::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
}

#[test]
fn test_mid_year_opening_entry_stays_out_of_movements() {
    let config = ProcessingConfig::default();
    let ledger = "\
Date,Journal,AN,Compte,Libellé,Débit,Crédit
01/01/2024,AN,OUI,521,Report banque,1000,
15/07/2024,AN,OUI,521,Report complémentaire,250,
20/07/2024,BQ,NON,521,Encaissement,100,
";
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), ledger.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();
    session.import(&workbook).unwrap();

    let balance = session.trial_balance(&BalanceRequest::new(2024)).unwrap();
    let bank = balance.row("521").unwrap();
    assert_eq!(bank.amounts.opening_debit, dec!(1250));
    assert_eq!(bank.amounts.movement_debit, dec!(100));
    assert_eq!(bank.amounts.closing_debit, dec!(1350));
}

#[test]
fn test_selection_by_class() {
    let mut session = loaded_session();
    let request = BalanceRequest::new(2024).with_selection(AccountSelection::all().with_classes(['6', '7']));
    let balance = session.trial_balance(&request).unwrap();

    let codes: Vec<&str> = balance.rows.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, vec!["601", "622", "701"]);
    assert_eq!(balance.imbalance(), dec!(-450000));

    let sheets = export_trial_balance(&balance, BalanceLayout::ByClass).unwrap();
    let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Classe_6", "Classe_7"]);
    assert!(sheets[0].csv.lines().last().unwrap().starts_with("Total,"));
}

#[test]
fn test_general_ledger_view() {
    let mut session = loaded_session();
    let filter = LedgerFilter::default().with_years([2024]).with_accounts(["521"]);

    let view = match session.execute(Operation::GeneralLedger(filter)).unwrap() {
        OperationOutput::Ledger(view) => view,
        other => panic!("unexpected output {:?}", other),
    };
    assert_eq!(view.len(), 4);
    assert_eq!(view.total_debit, dec!(2900000));
    assert_eq!(view.total_credit, dec!(450000));
    assert_eq!(view.observation, BalanceObservation::DebitBalance);

    // The unparsable row is still there, under year 0, with a zero debit.
    let undated = session
        .ledger_view(&LedgerFilter::default().with_years([0]))
        .unwrap();
    assert_eq!(undated.len(), 1);
    assert_eq!(undated.total_debit, Decimal::ZERO);

    let csv = ledger_view_to_csv(&view).unwrap();
    assert!(csv.contains("Total,,,,Solde Débiteur,2 900 000,450 000"));
}

#[test]
fn test_missing_columns_are_reported_together() {
    let config = ProcessingConfig::default();
    let ledger = "Date,Journal,Compte,Libellé\n01/01/2024,AN,101,Capital\n";
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), ledger.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();

    let err = session.import(&workbook).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputFormat);
    assert_eq!(
        err.to_string(),
        "Sheet 'Grand Livre' is missing required column(s): AN, Débit, Crédit"
    );
    assert!(!session.is_loaded());
}

#[test]
fn test_duplicate_account_after_normalization() {
    let config = ProcessingConfig::default();
    let chart = "Compte,Intitulé,Tableau\n601,Achats,Résultat\n601.0,Achats bis,Résultat\n";
    let workbook = Workbook::from_csv_readers(&config, chart.as_bytes(), LEDGER.as_bytes()).unwrap();
    let mut session = Session::new(config).unwrap();

    let err = session.import(&workbook).unwrap_err();
    assert!(matches!(
        err,
        StatementError::DuplicateAccount { ref code, first_row: 1, second_row: 2 } if code == "601"
    ));
}

#[test]
fn test_substitute_year_column() -> anyhow::Result<()> {
    let config = ProcessingConfig::default();
    let ledger = "\
Date,Journal,AN,Compte,Libellé,Débit,Crédit,Exercice
28/12/2023,VE,NON,701,Vente,,500,2024
02/01/2024,VE,NON,701,Vente,,200,2024.0
";
    let workbook = Workbook::from_csv_readers(&config, CHART.as_bytes(), ledger.as_bytes())?;
    let mut session = Session::new(config)?;
    session.import(&workbook)?;

    let request =
        BalanceRequest::new(2024).with_year_column(YearColumn::Named("Exercice".to_string()));
    let balance = session.trial_balance(&request)?;
    assert_eq!(balance.row("701").unwrap().amounts.closing_credit, dec!(700));

    let missing = BalanceRequest::new(2024).with_year_column(YearColumn::Named("Année".to_string()));
    let err = session.trial_balance(&missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Data);
    Ok(())
}

#[test]
fn test_config_from_json() {
    let config = ProcessingConfig::from_json_str(
        r#"{ "ledger_sheet": "GL", "opening_flag": "YES", "date_formats": ["%d/%m/%Y"] }"#,
    )
    .unwrap();
    assert_eq!(config.chart_sheet, DEFAULT_CHART_SHEET);
    assert_eq!(config.ledger_sheet, "GL");
    assert!(config.is_opening_flag(" yes "));

    let schema = ProcessingConfig::schema_as_json().unwrap();
    assert!(schema.contains("opening_flag"));
}

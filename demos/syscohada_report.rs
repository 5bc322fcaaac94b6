use std::error::Error;
use syscohada_statements::{
    export_trial_balance, statement_to_markdown, BalanceLayout, BalanceRequest, ComparativeRequest,
    LedgerFilter, Operation, OperationOutput, ProcessingConfig, Session, StatementsProcessor,
    Workbook,
};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(chart_path), Some(ledger_path)) = (args.next(), args.next()) else {
        eprintln!("usage: syscohada_report <plan_de_comptes.csv> <grand_livre.csv> [annee]");
        std::process::exit(2);
    };
    let year: Option<i32> = args.next().map(|y| y.parse()).transpose()?;

    let config = ProcessingConfig::default();
    let workbook = Workbook::from_csv_files(&config, &chart_path, &ledger_path)?;
    let mut session = Session::new(config)?;

    if let OperationOutput::Imported(summary) = session.execute(Operation::Import(workbook))? {
        println!(
            "{} comptes, {} écritures, exercices {:?}",
            summary.accounts, summary.entries, summary.fiscal_years
        );
        for warning in &summary.warnings {
            println!(
                " - ligne {}: valeur '{}' illisible dans '{}'",
                warning.row, warning.raw, warning.column
            );
        }
    }

    if let OperationOutput::Ledger(view) = session.execute(Operation::GeneralLedger(LedgerFilter::default()))? {
        println!(
            "Grand Livre: débit {}, crédit {}, {}",
            view.total_debit, view.total_credit, view.observation
        );
    }

    let statements = match year {
        Some(year) => StatementsProcessor::process(&mut session, &ComparativeRequest::new(year, year - 1))?,
        None => StatementsProcessor::process_latest(&mut session)?,
    };

    let current = statements.balance_sheet.current_year;
    if let OperationOutput::TrialBalance(balance) =
        session.execute(Operation::TrialBalance(BalanceRequest::new(current)))?
    {
        if !balance.is_balanced() {
            println!("Balance {} déséquilibrée de {}", current, balance.imbalance());
        }
        for sheet in export_trial_balance(&balance, BalanceLayout::Combined)? {
            println!("\n[{}]\n{}", sheet.name, sheet.csv);
        }
    }

    println!("{}", statement_to_markdown(&statements.balance_sheet));
    println!("{}", statement_to_markdown(&statements.income_statement));

    Ok(())
}

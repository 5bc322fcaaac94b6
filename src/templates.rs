//! SYSCOHADA statement layouts.
//!
//! Each side of a statement is a fixed, ordered list of line templates.
//! Headings and subtotals are ordinary lines: they only show an amount when
//! mapping codes in the chart of accounts route balances to them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineTemplate {
    pub code: &'static str,
    pub label: &'static str,
}

impl LineTemplate {
    const fn new(code: &'static str, label: &'static str) -> Self {
        Self { code, label }
    }

    /// Headings and totals are written in capitals.
    pub fn is_subtotal(&self) -> bool {
        !self.label.chars().any(char::is_lowercase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// "Bilan": lines are matched against balance sheet codes.
    BalanceSheet,
    /// "Compte de résultat": lines are matched against result codes.
    IncomeStatement,
}

impl StatementKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "Bilan",
            Self::IncomeStatement => "Compte de résultat",
        }
    }

    pub fn sides(&self) -> [StatementSide; 2] {
        match self {
            Self::BalanceSheet => [StatementSide::Assets, StatementSide::Liabilities],
            Self::IncomeStatement => [StatementSide::Expenses, StatementSide::Revenues],
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementSide {
    Assets,
    Liabilities,
    Expenses,
    Revenues,
}

impl StatementSide {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Assets => "Bilan Actif",
            Self::Liabilities => "Bilan Passif",
            Self::Expenses => "Charges",
            Self::Revenues => "Produits",
        }
    }

    pub fn templates(&self) -> &'static [LineTemplate] {
        match self {
            Self::Assets => BALANCE_SHEET_ASSETS,
            Self::Liabilities => BALANCE_SHEET_LIABILITIES,
            Self::Expenses => INCOME_STATEMENT_EXPENSES,
            Self::Revenues => INCOME_STATEMENT_REVENUES,
        }
    }
}

pub const BALANCE_SHEET_ASSETS: &[LineTemplate] = &[
    LineTemplate::new("AD", "IMMOBILISATIONS INCORPORELLES"),
    LineTemplate::new("AE", "Frais de développement et de prospection"),
    LineTemplate::new("AF", "Brevets, licences, logiciels et droits similaires"),
    LineTemplate::new("AG", "Fonds commercial et droit au bail"),
    LineTemplate::new("AH", "Autres immobilisations incorporelles"),
    LineTemplate::new("AI", "IMMOBILISATIONS CORPORELLES"),
    LineTemplate::new("AJ", "Terrains"),
    LineTemplate::new("AK", "Bâtiments"),
    LineTemplate::new("AL", "Aménagements, agencements et installations"),
    LineTemplate::new("AM", "Matériel, mobilier et actifs biologiques"),
    LineTemplate::new("AN", "Matériel de transport"),
    LineTemplate::new("AP", "AVANCES ET ACOMPTES VERSES SUR IMMOBILISATIONS"),
    LineTemplate::new("AQ", "IMMOBILISATIONS FINANCIÈRES"),
    LineTemplate::new("AR", "Titres de participation"),
    LineTemplate::new("AS", "Autres immobilisations financières"),
    LineTemplate::new("AZ", "TOTAL ACTIF IMMOBILISÉ"),
    LineTemplate::new("BA", "ACTIF CIRCULANT HAO"),
    LineTemplate::new("BB", "STOCKS ET ENCOURS"),
    LineTemplate::new("BG", "CRÉANCES ET EMPLOIS ASSIMILÉS"),
    LineTemplate::new("BH", "Fournisseurs avances versées"),
    LineTemplate::new("BI", "Clients"),
    LineTemplate::new("BJ", "Autres créances"),
    LineTemplate::new("BK", "TOTAL ACTIF CIRCULANT"),
    LineTemplate::new("BQ", "Titres de placement"),
    LineTemplate::new("BR", "Valeurs à encaisser"),
    LineTemplate::new("BS", "Banques, chèques postaux, caisse et assimilés"),
    LineTemplate::new("BT", "TOTAL TRÉSORERIE-ACTIF"),
    LineTemplate::new("BU", "Écart de conversion-Actif"),
    LineTemplate::new("BZ", "TOTAL ACTIF"),
];

pub const BALANCE_SHEET_LIABILITIES: &[LineTemplate] = &[
    LineTemplate::new("CA", "Capital"),
    LineTemplate::new("CB", "Apporteurs capital non appelé (-)"),
    LineTemplate::new("CD", "Primes liées au capital social"),
    LineTemplate::new("CE", "Écarts de réévaluation"),
    LineTemplate::new("CF", "Réserves indisponibles"),
    LineTemplate::new("CG", "Réserves libres"),
    LineTemplate::new("CH", "Report à nouveau (+ ou -)"),
    LineTemplate::new("CJ", "Résultat net de l'exercice (bénéfice + ou perte -)"),
    LineTemplate::new("CL", "Subventions d'investissement"),
    LineTemplate::new("CM", "Provisions réglementées"),
    LineTemplate::new("CP", "TOTAL CAPITAUX PROPRES ET RESSOURCES ASSIMILÉES"),
    LineTemplate::new("DA", "Emprunts et dettes financières diverses"),
    LineTemplate::new("DB", "Dettes de location-acquisition"),
    LineTemplate::new("DC", "Provisions pour risques et charges"),
    LineTemplate::new("DD", "TOTAL DETTES FINANCIÈRES ET RESSOURCES ASSIMILÉES"),
    LineTemplate::new("DF", "TOTAL RESSOURCES STABLES"),
    LineTemplate::new("DH", "Dettes circulantes HAO"),
    LineTemplate::new("DI", "Clients, avances reçues"),
    LineTemplate::new("DJ", "Fournisseurs d'exploitation"),
    LineTemplate::new("DK", "Dettes fiscales et sociales"),
    LineTemplate::new("DM", "Autres dettes"),
    LineTemplate::new("DN", "Provisions pour risques et charges à court terme"),
    LineTemplate::new("DP", "TOTAL PASSIF CIRCULANT"),
    LineTemplate::new("DQ", "Banques, crédits d'escompte"),
    LineTemplate::new("DR", "Banques, établissements financiers et crédits de trésorerie"),
    LineTemplate::new("DT", "TOTAL TRÉSORERIE-PASSIF"),
    LineTemplate::new("DV", "Écart de conversion-Passif"),
    LineTemplate::new("DZ", "TOTAL PASSIF"),
];

pub const INCOME_STATEMENT_EXPENSES: &[LineTemplate] = &[
    LineTemplate::new("RA", "Achats de marchandises"),
    LineTemplate::new("RB", "Variation de stocks de marchandises"),
    LineTemplate::new("RC", "Achats de matières premières et fournitures liées"),
    LineTemplate::new("RD", "Variation de stocks de matières premières et fournitures liées"),
    LineTemplate::new("RE", "Autres achats"),
    LineTemplate::new("RF", "Variation de stocks d'autres approvisionnements"),
    LineTemplate::new("RG", "Transports"),
    LineTemplate::new("RH", "Services extérieurs"),
    LineTemplate::new("RI", "Impôts et taxes"),
    LineTemplate::new("RJ", "Autres charges"),
    LineTemplate::new("RK", "Charges de personnel"),
    LineTemplate::new("RL", "Dotations aux amortissements, aux provisions et dépréciations"),
    LineTemplate::new("RM", "Frais financiers et charges assimilées"),
    LineTemplate::new("RN", "Dotations aux provisions et aux dépréciations financières"),
    LineTemplate::new("RO", "Valeurs comptables des cessions d'immobilisations"),
    LineTemplate::new("RP", "Autres charges HAO"),
    LineTemplate::new("RQ", "Participation des travailleurs"),
    LineTemplate::new("RS", "Impôts sur le résultat"),
];

pub const INCOME_STATEMENT_REVENUES: &[LineTemplate] = &[
    LineTemplate::new("TA", "Ventes de marchandises"),
    LineTemplate::new("XA", "MARGE COMMERCIALE"),
    LineTemplate::new("TB", "Ventes de produits fabriqués"),
    LineTemplate::new("TC", "Travaux, services vendus"),
    LineTemplate::new("TD", "Produits accessoires"),
    LineTemplate::new("XB", "CHIFFRE D'AFFAIRES"),
    LineTemplate::new("TE", "Production stockée (ou déstockage)"),
    LineTemplate::new("TF", "Production immobilisée"),
    LineTemplate::new("TG", "Subventions d'exploitation"),
    LineTemplate::new("TH", "Autres produits"),
    LineTemplate::new("TI", "Transferts de charges d'exploitation"),
    LineTemplate::new("XC", "VALEUR AJOUTÉE"),
    LineTemplate::new("XD", "EXCÉDENT BRUT D'EXPLOITATION"),
    LineTemplate::new("TJ", "Reprises d'amortissements, de provisions et dépréciations"),
    LineTemplate::new("XE", "RÉSULTAT D'EXPLOITATION"),
    LineTemplate::new("TK", "Revenus financiers et assimilés"),
    LineTemplate::new("TL", "Reprises de provisions et dépréciations financières"),
    LineTemplate::new("TM", "Transferts de charges financières"),
    LineTemplate::new("XF", "RÉSULTAT FINANCIER"),
    LineTemplate::new("XG", "RÉSULTAT DES ACTIVITÉS ORDINAIRES"),
    LineTemplate::new("TN", "Produits des cessions d'immobilisations"),
    LineTemplate::new("TO", "Autres produits HAO"),
    LineTemplate::new("XH", "RÉSULTAT HORS ACTIVITÉS ORDINAIRES"),
    LineTemplate::new("XI", "RÉSULTAT NET"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_subtotal_detection() {
        let total = LineTemplate::new("AZ", "TOTAL ACTIF IMMOBILISÉ");
        let detail = LineTemplate::new("AJ", "Terrains");
        assert!(total.is_subtotal());
        assert!(!detail.is_subtotal());
    }

    #[test]
    fn test_codes_are_unique_within_each_statement() {
        for kind in [StatementKind::BalanceSheet, StatementKind::IncomeStatement] {
            let mut seen = HashSet::new();
            for side in kind.sides() {
                for line in side.templates() {
                    assert_eq!(line.code.len(), 2, "code {}", line.code);
                    assert!(seen.insert(line.code), "duplicate code {} in {}", line.code, kind);
                }
            }
        }
    }

    #[test]
    fn test_balance_sheet_layout_bounds() {
        assert_eq!(BALANCE_SHEET_ASSETS.first().unwrap().code, "AD");
        assert_eq!(BALANCE_SHEET_ASSETS.last().unwrap().code, "BZ");
        assert_eq!(BALANCE_SHEET_LIABILITIES.first().unwrap().code, "CA");
        assert_eq!(BALANCE_SHEET_LIABILITIES.last().unwrap().code, "DZ");
        assert_eq!(StatementSide::Liabilities.title(), "Bilan Passif");
    }
}

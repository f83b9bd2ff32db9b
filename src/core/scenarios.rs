use serde::{Deserialize, Serialize};

use super::types::{Debt, DebtType};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleScenario {
    #[serde(alias = "credit-card-stack", alias = "credit_card_stack")]
    CreditCardStack,
    #[serde(alias = "auto-and-personal", alias = "auto_and_personal")]
    AutoAndPersonal,
    #[serde(alias = "student-loans", alias = "student_loans")]
    StudentLoans,
}

impl SampleScenario {
    pub const ALL: [SampleScenario; 3] = [
        SampleScenario::CreditCardStack,
        SampleScenario::AutoAndPersonal,
        SampleScenario::StudentLoans,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SampleScenario::CreditCardStack => "creditCardStack",
            SampleScenario::AutoAndPersonal => "autoAndPersonal",
            SampleScenario::StudentLoans => "studentLoans",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SampleScenario::CreditCardStack => "credit card stack",
            SampleScenario::AutoAndPersonal => "auto and personal",
            SampleScenario::StudentLoans => "student loans",
        }
    }

    pub fn debts(self) -> Vec<Debt> {
        match self {
            SampleScenario::CreditCardStack => vec![
                fixture("1", "Chase Sapphire", 3_500.0, 24.99, 105.0, DebtType::CreditCard),
                fixture("2", "Capital One", 1_200.0, 22.49, 35.0, DebtType::CreditCard),
                fixture("3", "Store Card", 450.0, 27.99, 25.0, DebtType::CreditCard),
            ],
            SampleScenario::AutoAndPersonal => vec![
                fixture("1", "Auto Loan", 18_500.0, 6.25, 385.0, DebtType::AutoLoan),
                fixture("2", "Personal Loan", 8_200.0, 14.99, 245.0, DebtType::PersonalLoan),
            ],
            SampleScenario::StudentLoans => vec![
                fixture("1", "Federal Loan 1", 12_500.0, 4.53, 145.0, DebtType::StudentLoan),
                fixture("2", "Federal Loan 2", 8_900.0, 5.28, 105.0, DebtType::StudentLoan),
                fixture("3", "Private Loan", 15_600.0, 8.75, 185.0, DebtType::StudentLoan),
            ],
        }
    }
}

fn fixture(
    id: &str,
    name: &str,
    balance: f64,
    interest_rate_apr: f64,
    min_payment: f64,
    debt_type: DebtType,
) -> Debt {
    Debt {
        id: id.to_string(),
        name: name.to_string(),
        balance,
        interest_rate_apr,
        min_payment,
        debt_type,
    }
}

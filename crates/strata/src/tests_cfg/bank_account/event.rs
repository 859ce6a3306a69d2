use crate::{Event, Record};

#[derive(Clone, Debug, PartialEq, Record, Event)]
pub struct AccountOpened {
    pub id: String,
    pub holder_name: String,
}

#[derive(Clone, Debug, PartialEq, Record, Event)]
pub struct FundsDeposited {
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Record, Event)]
pub struct FundsWithdrawn {
    pub amount: f64,
}

/// Recorded for auditing only, the account state ignores it.
#[derive(Clone, Debug, PartialEq, Record, Event)]
#[event(name = "STATEMENT_ISSUED")]
pub struct StatementIssued {
    pub id: String,
}

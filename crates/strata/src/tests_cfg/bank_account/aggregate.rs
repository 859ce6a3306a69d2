use std::sync::OnceLock;

use super::{AccountOpened, FundsDeposited, FundsWithdrawn};
use crate::aggregate::{Aggregate, Apply, Handlers};

#[derive(Debug, Default, PartialEq)]
pub struct BankAccount {
    pub id: String,
    pub holder_name: String,
    pub balance: f64,
}

impl Aggregate for BankAccount {
    fn aggregate_type() -> &'static str {
        "bank_account"
    }

    fn handlers() -> &'static Handlers<Self> {
        static HANDLERS: OnceLock<Handlers<BankAccount>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            Handlers::new()
                .on::<AccountOpened>()
                .on::<FundsDeposited>()
                .on::<FundsWithdrawn>()
        })
    }
}

impl Apply<AccountOpened> for BankAccount {
    fn apply(&mut self, event: &AccountOpened) {
        self.id = event.id.clone();
        self.holder_name = event.holder_name.clone();
    }
}

impl Apply<FundsDeposited> for BankAccount {
    fn apply(&mut self, event: &FundsDeposited) {
        self.balance += event.amount;
    }
}

impl Apply<FundsWithdrawn> for BankAccount {
    fn apply(&mut self, event: &FundsWithdrawn) {
        self.balance -= event.amount;
    }
}

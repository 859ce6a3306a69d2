use thiserror::Error;

use super::{AccountOpened, BankAccount, FundsDeposited, FundsWithdrawn};

impl BankAccount {
    // Doesn't have &self parameter, so it is the entry command.
    pub fn open_account(id: String, holder_name: String) -> AccountOpened {
        AccountOpened { id, holder_name }
    }

    pub fn deposit_funds(&self, amount: f64) -> Result<FundsDeposited, BankAccountError> {
        if amount == 0.0 {
            return Err(BankAccountError::ZeroAmount);
        } else if amount < 0.0 {
            return Err(BankAccountError::NegativeAmount);
        }

        Ok(FundsDeposited { amount })
    }

    pub fn withdraw_funds(&self, amount: f64) -> Result<FundsWithdrawn, BankAccountError> {
        if amount == 0.0 {
            return Err(BankAccountError::ZeroAmount);
        } else if amount < 0.0 {
            return Err(BankAccountError::NegativeAmount);
        }

        let new_balance = self.balance - amount;
        if new_balance < 0.0 {
            return Err(BankAccountError::InsufficientFunds);
        }

        Ok(FundsWithdrawn { amount })
    }
}

#[derive(Debug, Error)]
pub enum BankAccountError {
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("negative amount")]
    NegativeAmount,
    #[error("zero amount")]
    ZeroAmount,
}

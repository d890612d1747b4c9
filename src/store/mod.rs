//! Document store seams.
//!
//! Each collection the portal touches has its own trait so handlers only
//! see the operations they need. [`StoreHandle`] carries the
//! "is the store there at all" capability, checked on every request.

pub mod memory;
pub mod mysql;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::{PortalError, PortalResult},
    model::{expense::Expense, payroll::SalarySlip, user::User},
};

/// Credential documents, unique by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> PortalResult<Option<User>>;

    /// Inserts a new user. Fails with `DuplicateEmail` when the email is taken.
    async fn insert(&self, user: &User) -> PortalResult<()>;

    async fn list_by_role(&self, role: &str) -> PortalResult<Vec<User>>;
}

/// Salary slips keyed by (employee_id, month).
#[async_trait]
pub trait SalarySlipStore: Send + Sync {
    /// Replaces the whole document for the slip's natural key, or inserts it.
    async fn upsert(&self, slip: &SalarySlip) -> PortalResult<()>;

    /// Most recently generated slips first, at most `limit`.
    async fn recent(&self, limit: usize) -> PortalResult<Vec<SalarySlip>>;

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<SalarySlip>>;
}

/// Expense claims keyed by (employee_id, month).
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Replaces the whole document for the expense's natural key, or inserts it.
    async fn upsert(&self, expense: &Expense) -> PortalResult<()>;

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<Expense>>;
}

#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub salary_slips: Arc<dyn SalarySlipStore>,
    pub expenses: Arc<dyn ExpenseStore>,
}

impl Stores {
    /// Uses one backend for all three collections.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + SalarySlipStore + ExpenseStore + 'static,
    {
        Self {
            users: backend.clone(),
            salary_slips: backend.clone(),
            expenses: backend,
        }
    }
}

/// Process-wide store access, set once at startup.
#[derive(Clone)]
pub struct StoreHandle {
    stores: Option<Stores>,
}

impl StoreHandle {
    pub fn available(stores: Stores) -> Self {
        Self {
            stores: Some(stores),
        }
    }

    pub fn unavailable() -> Self {
        Self { stores: None }
    }

    pub fn is_available(&self) -> bool {
        self.stores.is_some()
    }

    pub fn get(&self) -> PortalResult<&Stores> {
        self.stores.as_ref().ok_or(PortalError::StoreUnavailable)
    }
}

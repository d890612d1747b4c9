use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use async_trait::async_trait;

use super::{ExpenseStore, SalarySlipStore, UserStore};
use crate::{
    error::{PortalError, PortalResult},
    model::{expense::Expense, payroll::SalarySlip, user::User},
};

type NaturalKey = (String, String);

/// In-process store for tests and local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    salary_slips: RwLock<BTreeMap<NaturalKey, SalarySlip>>,
    expenses: RwLock<BTreeMap<NaturalKey, Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().expect("user map poisoned").len()
    }

    pub fn users_with_email(&self, email: &str) -> usize {
        self.users
            .read()
            .expect("user map poisoned")
            .values()
            .filter(|u| u.email == email)
            .count()
    }

    pub fn salary_slip_count(&self) -> usize {
        self.salary_slips.read().expect("slip map poisoned").len()
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.read().expect("expense map poisoned").len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> PortalResult<Option<User>> {
        let users = self.users.read().expect("user map poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: &User) -> PortalResult<()> {
        let mut users = self.users.write().expect("user map poisoned");
        if users.values().any(|u| u.email == user.email) {
            return Err(PortalError::DuplicateEmail);
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn list_by_role(&self, role: &str) -> PortalResult<Vec<User>> {
        let users = self.users.read().expect("user map poisoned");
        let mut matching: Vec<User> = users.values().filter(|u| u.role == role).cloned().collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matching)
    }
}

#[async_trait]
impl SalarySlipStore for MemoryStore {
    async fn upsert(&self, slip: &SalarySlip) -> PortalResult<()> {
        let key = (slip.employee_id.clone(), slip.month.clone());
        self.salary_slips
            .write()
            .expect("slip map poisoned")
            .insert(key, slip.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> PortalResult<Vec<SalarySlip>> {
        let slips = self.salary_slips.read().expect("slip map poisoned");
        let mut all: Vec<SalarySlip> = slips.values().cloned().collect();
        all.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        all.truncate(limit);
        Ok(all)
    }

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<SalarySlip>> {
        let slips = self.salary_slips.read().expect("slip map poisoned");
        Ok(slips
            .values()
            .filter(|s| s.employee_id == employee_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn upsert(&self, expense: &Expense) -> PortalResult<()> {
        let key = (expense.employee_id.clone(), expense.month.clone());
        self.expenses
            .write()
            .expect("expense map poisoned")
            .insert(key, expense.clone());
        Ok(())
    }

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<Expense>> {
        let expenses = self.expenses.read().expect("expense map poisoned");
        Ok(expenses
            .values()
            .filter(|e| e.employee_id == employee_id)
            .cloned()
            .collect())
    }
}

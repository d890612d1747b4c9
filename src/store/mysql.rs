use async_trait::async_trait;
use sqlx::MySqlPool;

use super::{ExpenseStore, SalarySlipStore, UserStore};
use crate::{
    error::{PortalError, PortalResult},
    model::{expense::Expense, payroll::SalarySlip, user::User},
};

/// Collections, one table each. Slips and expenses use the natural key as
/// their primary key so `REPLACE INTO` is a whole-document upsert.
const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id CHAR(36) NOT NULL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NOT NULL,
        role VARCHAR(32) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        UNIQUE KEY uq_users_email (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS salary_slips (
        employee_id VARCHAR(64) NOT NULL,
        month VARCHAR(32) NOT NULL,
        basic DOUBLE NOT NULL,
        bonus DOUBLE NOT NULL,
        deductions DOUBLE NOT NULL,
        net_salary DOUBLE NOT NULL,
        generated_at DATETIME(6) NOT NULL,
        PRIMARY KEY (employee_id, month),
        KEY idx_salary_slips_generated_at (generated_at)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        employee_id VARCHAR(64) NOT NULL,
        month VARCHAR(32) NOT NULL,
        amount DOUBLE NOT NULL,
        category VARCHAR(255) NOT NULL,
        description TEXT NOT NULL,
        submitted_at DATETIME(6) NOT NULL,
        PRIMARY KEY (employee_id, month)
    )
    "#,
];

/// MySQL integrity constraint violation.
const DUPLICATE_KEY_STATE: &str = "23000";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> PortalResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn ensure_schema(&self) -> PortalResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_by_email(&self, email: &str) -> PortalResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, user: &User) -> PortalResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, name, email, role, password_hash) VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(DUPLICATE_KEY_STATE) =>
            {
                Err(PortalError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_by_role(&self, role: &str) -> PortalResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, role, password_hash
            FROM users
            WHERE role = ?
            ORDER BY name
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[async_trait]
impl SalarySlipStore for MySqlStore {
    async fn upsert(&self, slip: &SalarySlip) -> PortalResult<()> {
        sqlx::query(
            r#"
            REPLACE INTO salary_slips
            (employee_id, month, basic, bonus, deductions, net_salary, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&slip.employee_id)
        .bind(&slip.month)
        .bind(slip.basic)
        .bind(slip.bonus)
        .bind(slip.deductions)
        .bind(slip.net_salary)
        .bind(slip.generated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> PortalResult<Vec<SalarySlip>> {
        let slips = sqlx::query_as::<_, SalarySlip>(
            r#"
            SELECT employee_id, month, basic, bonus, deductions, net_salary, generated_at
            FROM salary_slips
            ORDER BY generated_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await?;

        Ok(slips)
    }

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<SalarySlip>> {
        let slips = sqlx::query_as::<_, SalarySlip>(
            r#"
            SELECT employee_id, month, basic, bonus, deductions, net_salary, generated_at
            FROM salary_slips
            WHERE employee_id = ?
            ORDER BY month
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slips)
    }
}

#[async_trait]
impl ExpenseStore for MySqlStore {
    async fn upsert(&self, expense: &Expense) -> PortalResult<()> {
        sqlx::query(
            r#"
            REPLACE INTO expenses
            (employee_id, month, amount, category, description, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.employee_id)
        .bind(&expense.month)
        .bind(expense.amount)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn for_employee(&self, employee_id: &str) -> PortalResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT employee_id, month, amount, category, description, submitted_at
            FROM expenses
            WHERE employee_id = ?
            ORDER BY month
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}

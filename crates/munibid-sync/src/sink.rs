//! Postgres persistence sink. The whole canonical table is replaced in a
//! single transaction; there is no per-record upsert path.

use anyhow::Context;
use munibid_core::BidRecord;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub const TABLE_NAME: &str = "contract_opportunities";

const DROP_TABLE_SQL: &str = r#"DROP TABLE IF EXISTS contract_opportunities"#;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE contract_opportunities (
    "Title" TEXT NOT NULL,
    "Department" TEXT,
    "Industry" TEXT NOT NULL,
    "Estimated Value" TEXT,
    "Release Date_Raw" TEXT,
    "Release Date_Display" TEXT,
    "Due Date_Raw" TEXT,
    "Due Date_Display" TEXT,
    "Instructions" TEXT,
    "Bid Deposit" TEXT,
    "Addendum" TEXT,
    "Comments" TEXT,
    "Standard_Forms" TEXT,
    "Bid_Forms" TEXT,
    "City" TEXT NOT NULL,
    "Source Type" TEXT NOT NULL,
    "Source URL" TEXT,
    "Bid Number" TEXT,
    "Status" TEXT NOT NULL
)
"#;

const INSERT_SQL: &str = r#"
INSERT INTO contract_opportunities (
    "Title", "Department", "Industry", "Estimated Value",
    "Release Date_Raw", "Release Date_Display", "Due Date_Raw", "Due Date_Display",
    "Instructions", "Bid Deposit", "Addendum", "Comments",
    "Standard_Forms", "Bid_Forms", "City", "Source Type",
    "Source URL", "Bid Number", "Status"
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
"#;

// The read side sorts on the display dates.
const INDEX_SQL: [&str; 2] = [
    r#"CREATE INDEX idx_contract_opportunities_due ON contract_opportunities ("Due Date_Display")"#,
    r#"CREATE INDEX idx_contract_opportunities_release ON contract_opportunities ("Release Date_Display")"#,
];

pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .context("connecting to postgres")?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop, recreate and refill the canonical table atomically. Returns
    /// the number of rows written.
    pub async fn replace_all(&self, records: &[BidRecord]) -> anyhow::Result<u64> {
        let mut tx = self.pool.begin().await.context("opening sink transaction")?;

        sqlx::query(DROP_TABLE_SQL)
            .execute(&mut *tx)
            .await
            .context("dropping previous table")?;
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut *tx)
            .await
            .context("creating canonical table")?;

        for record in records {
            sqlx::query(INSERT_SQL)
                .bind(&record.title)
                .bind(&record.department)
                .bind(&record.industry)
                .bind(&record.estimated_value)
                .bind(&record.release_date_raw)
                .bind(&record.release_date_display)
                .bind(&record.due_date_raw)
                .bind(&record.due_date_display)
                .bind(&record.instructions)
                .bind(&record.bid_deposit)
                .bind(&record.addendum)
                .bind(&record.comments)
                .bind(&record.standard_forms)
                .bind(&record.bid_forms)
                .bind(record.city.as_str())
                .bind(&record.source_type)
                .bind(&record.source_url)
                .bind(&record.bid_number)
                .bind(record.status.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("inserting record `{}`", record.title))?;
        }

        for statement in INDEX_SQL {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .context("creating read-side index")?;
        }

        tx.commit().await.context("committing table replacement")?;
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use munibid_core::CANONICAL_COLUMNS;

    #[test]
    fn schema_carries_every_canonical_column() {
        for column in CANONICAL_COLUMNS {
            let quoted = format!("\"{column}\"");
            assert!(CREATE_TABLE_SQL.contains(&quoted), "create is missing {column}");
            assert!(INSERT_SQL.contains(&quoted), "insert is missing {column}");
        }
    }

    #[test]
    fn insert_binds_one_placeholder_per_column() {
        let placeholders = (1..=CANONICAL_COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>();
        for placeholder in &placeholders {
            assert!(INSERT_SQL.contains(placeholder));
        }
        assert!(!INSERT_SQL.contains(&format!("${}", CANONICAL_COLUMNS.len() + 1)));
    }

    #[test]
    fn read_side_sort_columns_are_indexed() {
        assert!(INDEX_SQL.iter().any(|sql| sql.contains("Due Date_Display")));
        assert!(INDEX_SQL.iter().any(|sql| sql.contains("Release Date_Display")));
        for sql in INDEX_SQL {
            assert!(sql.contains(TABLE_NAME));
        }
    }
}

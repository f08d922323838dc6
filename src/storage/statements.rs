//! SQL statements
//!
//! Built once from the configured table names. Caller-supplied values only
//! ever travel as positional parameters.

/// Statement set for one pair of wallet/transaction tables
#[derive(Debug, Clone)]
pub struct Statements {
    pub get_wallet: String,
    pub get_wallet_pair: String,
    pub add_transaction: String,
    pub all_recipients: String,
    pub recipients_since: String,
    pub create_wallet: String,
    pub all_wallet_ids: String,
}

impl Statements {
    pub fn new(wallets: &str, transactions: &str) -> Self {
        Self {
            get_wallet: format!(
                r#"
                SELECT slack_id, wallet_phrase, wallet_address
                FROM {wallets}
                WHERE slack_id = $1
                LIMIT 1
                "#
            ),
            get_wallet_pair: format!(
                r#"
                SELECT slack_id, wallet_phrase, wallet_address
                FROM {wallets}
                WHERE slack_id = $1 OR slack_id = $2
                LIMIT 2
                "#
            ),
            add_transaction: format!(
                r#"
                INSERT INTO {transactions} (
                    emitent_id, recipient_id, transaction_hash,
                    transaction_date, transaction_amount
                )
                VALUES ($1, $2, $3, $4, $5)
                "#
            ),
            all_recipients: recipients_query(wallets, transactions, false),
            recipients_since: recipients_query(wallets, transactions, true),
            create_wallet: format!(
                r#"
                INSERT INTO {wallets} (slack_id, wallet_phrase, wallet_address, wallet_created)
                VALUES ($1, $2, $3, $4)
                "#
            ),
            all_wallet_ids: format!("SELECT slack_id FROM {wallets}"),
        }
    }
}

/// Per-recipient totals, outer-joined with wallets so recipients whose wallet
/// row is gone still show up.
fn recipients_query(wallets: &str, transactions: &str, since: bool) -> String {
    let filter = if since {
        format!("WHERE {transactions}.transaction_date >= $1")
    } else {
        String::new()
    };

    format!(
        r#"
        SELECT
            {transactions}.recipient_id,
            sum({transactions}.transaction_amount) AS transaction_amount,
            max({transactions}.transaction_date) AS transaction_date,
            max({wallets}.wallet_address) AS wallet_address
        FROM {transactions}
        LEFT JOIN {wallets}
            ON {wallets}.slack_id = {transactions}.recipient_id
        {filter}
        GROUP BY {transactions}.recipient_id
        ORDER BY transaction_amount DESC, transaction_date DESC
        "#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_are_interpolated() {
        let stmts = Statements::new("bot_wallets", "bot_transactions");

        assert!(stmts.get_wallet.contains("FROM bot_wallets"));
        assert!(stmts.get_wallet.contains("LIMIT 1"));
        assert!(stmts.get_wallet_pair.contains("LIMIT 2"));
        assert!(stmts.add_transaction.contains("INSERT INTO bot_transactions"));
        assert!(stmts.create_wallet.contains("INSERT INTO bot_wallets"));
        assert_eq!(stmts.all_wallet_ids, "SELECT slack_id FROM bot_wallets");
    }

    #[test]
    fn test_only_the_windowed_query_takes_a_parameter() {
        let stmts = Statements::new("wallets", "transactions");

        assert!(!stmts.all_recipients.contains("$1"));
        assert!(stmts
            .recipients_since
            .contains("WHERE transactions.transaction_date >= $1"));
        assert!(stmts
            .all_recipients
            .contains("ORDER BY transaction_amount DESC, transaction_date DESC"));
        assert!(stmts.all_recipients.contains("LEFT JOIN wallets"));
    }
}

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use time::OffsetDateTime;

/// スキーママイグレーション（起動時に適用）
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// インメモリ DB を指定する接続先（テスト用）
pub const IN_MEMORY: &str = "sqlite::memory:";

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite コネクションプールを作成し、マイグレーションを適用する
///
/// # Note
/// インメモリ DB は接続ごとに別 DB になるため、接続数を 1 に固定し
/// アイドル切断も無効にする
pub async fn connect(database_path: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_path == IN_MEMORY;

    let (options, max_connections) = if in_memory {
        (SqliteConnectOptions::from_str(database_path)?, 1)
    } else {
        (
            SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(BUSY_TIMEOUT),
            MAX_CONNECTIONS,
        )
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    Ok(pool)
}

/// 現在時刻（UNIX秒）
///
/// DB のタイムスタンプ列はすべて UNIX 秒で保存する
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

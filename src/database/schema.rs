pub const USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        is_active BOOLEAN NOT NULL DEFAULT 1,
        date_joined TEXT NOT NULL
    )
"#;

pub const ADDRESSES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        house_flat TEXT NOT NULL,
        street TEXT NOT NULL,
        landmark TEXT,
        area TEXT NOT NULL,
        district TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        country TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

pub const ADDRESSES_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_addresses_user ON addresses(user_id)";

// One active code per email; `expiry_time` holds unix millis.
pub const OTP_CODES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS otp_codes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        otp_code TEXT NOT NULL,
        expiry_time INTEGER NOT NULL
    )
"#;

pub const USER_ERROR_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user_error (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE COLLATE NOCASE,
        text TEXT NOT NULL
    )
"#;

pub const USER_VALIDATION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user_validation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE COLLATE NOCASE,
        text TEXT NOT NULL
    )
"#;

pub const USER_INFORMATION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS user_information (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL UNIQUE COLLATE NOCASE,
        text TEXT NOT NULL
    )
"#;

pub const ALL: &[&str] = &[
    USERS_TABLE,
    ADDRESSES_TABLE,
    ADDRESSES_USER_INDEX,
    OTP_CODES_TABLE,
    USER_ERROR_TABLE,
    USER_VALIDATION_TABLE,
    USER_INFORMATION_TABLE,
];

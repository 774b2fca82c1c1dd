//! Compiled-in message catalog. Consulted whenever the database has no row for
//! a code, and served as-is by the constants endpoint.

use serde_json::{json, Map, Value};

use crate::models::message::MessageCategory;

pub const ERRORS: &[(&str, &str)] = &[
    ("EA003", "Only letters, numbers, spaces and hyphens are allowed."),
    ("EA004", "This field is required."),
    ("EA005", "Postal code must contain only letters and numbers."),
    ("EA006", "Postal code must be between 4 and 10 characters."),
    ("EA007", "Invalid postal code."),
    ("EA008", "Postal code is required."),
    ("EA010", "Something went wrong. Please try again later."),
    ("EA011", "Unable to save address. Please try again."),
    ("EA012", "Unexpected error while saving address."),
    ("EA013", "No address found."),
    ("EA014", "Postal code lookup failed."),
    ("EC001", "Wrong old password."),
    ("EC002", "Passwords do not match."),
    ("EF001", "Email is not registered."),
    ("EF002", "Please enter the 6-digit verification code."),
    ("EF003", "Passwords do not match."),
    ("EF004", "Session expired. Please request a new verification code."),
    ("EF005", "Invalid verification code."),
    ("EF006", "Failed to update password. Please try again."),
    ("EG001", "Something went wrong."),
    ("EL001", "Username or password not correct."),
    ("EP016", "Username already exists."),
    ("ES003", "Email already exists."),
    ("EV001", "All fields are required."),
    ("EV002", "Username already exists."),
];

pub const VALIDATIONS: &[(&str, &str)] = &[
    ("VA001", "Only letters are allowed."),
    ("VA002", "This field is required."),
    ("VA003", "Username may contain letters, numbers, dots and underscores only."),
    ("VA004", "Invalid input."),
    ("VA005", "Enter a valid email address."),
    ("VA006", "Phone number must contain only digits."),
    ("VA007", "Phone number must be 10 digits."),
    ("VP001", "Password must be at least 8 characters and not entirely numeric."),
    ("VP009", "Enter a valid phone number."),
];

pub const INFORMATION: &[(&str, &str)] = &[
    ("IA001", "Address saved successfully."),
    ("IA002", "Address updated successfully."),
    ("IA004", "Edit Address"),
    ("IA005", "Add Address"),
    ("IA006", "Please wait..."),
    ("ICP001", "Password changed successfully"),
    ("IF003", "Password reset successful."),
    ("IF004", "Enter the code sent to your email and choose a new password."),
    ("IF005", "Verify Code"),
    ("IF006", "Reset Password"),
    ("IFP001", "Verification code sent successfully."),
    ("IFP002", "Password reset successful."),
    ("IL001", "Login successful"),
    ("IR001", "User registered successfully."),
];

pub fn entries(category: MessageCategory) -> &'static [(&'static str, &'static str)] {
    match category {
        MessageCategory::Error => ERRORS,
        MessageCategory::Info => INFORMATION,
        MessageCategory::Validation => VALIDATIONS,
    }
}

/// Case-insensitive lookup in the static table.
pub fn lookup(category: MessageCategory, code: &str) -> Option<&'static str> {
    let code = code.trim();
    entries(category)
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, text)| *text)
}

/// `{ERRORS: {...}, VALIDATIONS: {...}, INFORMATION: {...}}`
pub fn as_json() -> Value {
    fn section(entries: &[(&str, &str)]) -> Value {
        let map: Map<String, Value> = entries
            .iter()
            .map(|(code, text)| (code.to_string(), json!(text)))
            .collect();
        Value::Object(map)
    }

    json!({
        "ERRORS": section(ERRORS),
        "VALIDATIONS": section(VALIDATIONS),
        "INFORMATION": section(INFORMATION),
    })
}

use strum_macros::{Display, EnumString};

/// What `POST /users` does when the email is already on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DuplicateUserPolicy {
    /// Answer `{message: "User already exists"}` with a success status.
    #[default]
    Acknowledge,
    /// Answer 400.
    Reject,
}

/// What `PUT /attendance/{email}/{date}` does when no record exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum AttendanceUpdatePolicy {
    #[default]
    Upsert,
    RequireExisting,
}

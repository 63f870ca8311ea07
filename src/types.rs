/// Shared enums used across the codebase
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enums that travel as their upper-case names (query strings, request
/// bodies, text columns).
pub trait NamedEnum: Sized + Copy + 'static {
    /// Type name used in validation messages
    const TYPE_NAME: &'static str;

    fn variants() -> &'static [Self];

    fn name(&self) -> &'static str;

    fn names() -> Vec<&'static str> {
        Self::variants().iter().map(|v| v.name()).collect()
    }

    fn from_name(value: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.name() == value)
    }
}

macro_rules! named_enum {
    ($ty:ident, $type_name:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl NamedEnum for $ty {
            const TYPE_NAME: &'static str = $type_name;

            fn variants() -> &'static [Self] {
                &[$($ty::$variant),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty as NamedEnum>::from_name(s).ok_or_else(|| {
                    format!(
                        "Invalid value: '{}'. Accepted values for {} are: {}",
                        s,
                        <$ty as NamedEnum>::TYPE_NAME,
                        <$ty as NamedEnum>::names().join(", ")
                    )
                })
            }
        }
    };
}

/// Kind of lendable hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceType {
    Mouse,
    Keyboard,
    Monitor,
    Laptop,
    Headphone,
    Case,
    Charger,
}

named_enum!(DeviceType, "Type", {
    Mouse => "MOUSE",
    Keyboard => "KEYBOARD",
    Monitor => "MONITOR",
    Laptop => "LAPTOP",
    Headphone => "HEADPHONE",
    Case => "CASE",
    Charger => "CHARGER",
});

/// Condition of a device; scales its original price into a borrowing price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateType {
    New,
    LikeNew,
    Used,
    Broken,
}

named_enum!(RateType, "RateType", {
    New => "NEW",
    LikeNew => "LIKENEW",
    Used => "USED",
    Broken => "BROKEN",
});

impl RateType {
    pub fn value(&self) -> f64 {
        match self {
            RateType::New => 1.0,
            RateType::LikeNew => 0.8,
            RateType::Used => 0.5,
            RateType::Broken => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

named_enum!(SortDirection, "SortParam", {
    Asc => "ASC",
    Desc => "DESC",
});

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Severity stored on audit rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

named_enum!(LogLevel, "LogLevel", {
    Info => "INFO",
    Warn => "WARN",
    Error => "ERROR",
});

/// What a request did, derived from its HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Get,
}

named_enum!(Operation, "Action", {
    Create => "CREATE",
    Update => "UPDATE",
    Delete => "DELETE",
    Get => "GET",
});

impl Operation {
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "POST" => Operation::Create,
            "PUT" | "PATCH" => Operation::Update,
            "DELETE" => Operation::Delete,
            _ => Operation::Get,
        }
    }
}

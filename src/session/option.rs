//! Recognized session directives.

use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

macro_rules! session_options {
    ($($variant:ident => $name:literal,)+) => {
        /// A recognized session configuration directive.
        ///
        /// Configuration keys are checked against this allow-list before any
        /// of them reach the runtime.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum SessionOption {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl SessionOption {
            /// Every recognized directive, in declaration order.
            pub const ALL: &'static [SessionOption] = &[$(SessionOption::$variant,)+];

            /// The directive name as it appears in configuration.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(SessionOption::$variant => $name,)+
                }
            }

            /// Look up a directive by its configuration name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(SessionOption::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

session_options! {
    SavePath => "save_path",
    Name => "name",
    SaveHandler => "save_handler",
    AutoStart => "auto_start",
    GcProbability => "gc_probability",
    GcDivisor => "gc_divisor",
    GcMaxlifetime => "gc_maxlifetime",
    SerializeHandler => "serialize_handler",
    CookieLifetime => "cookie_lifetime",
    CookiePath => "cookie_path",
    CookieDomain => "cookie_domain",
    CookieSecure => "cookie_secure",
    CookieHttponly => "cookie_httponly",
    CookieSamesite => "cookie_samesite",
    UseStrictMode => "use_strict_mode",
    UseCookies => "use_cookies",
    UseOnlyCookies => "use_only_cookies",
    RefererCheck => "referer_check",
    CacheLimiter => "cache_limiter",
    CacheExpire => "cache_expire",
    UseTransSid => "use_trans_sid",
    TransSidTags => "trans_sid_tags",
    TransSidHosts => "trans_sid_hosts",
    SidLength => "sid_length",
    SidBitsPerCharacter => "sid_bits_per_character",
    UploadProgressEnabled => "upload_progress.enabled",
    UploadProgressCleanup => "upload_progress.cleanup",
    UploadProgressPrefix => "upload_progress.prefix",
    UploadProgressName => "upload_progress.name",
    UploadProgressFreq => "upload_progress.freq",
    UploadProgressMinFreq => "upload_progress.min_freq",
    LazyWrite => "lazy_write",
}

impl fmt::Display for SessionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionOption {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| SessionError::OptionInvalid(s.into()))
    }
}

/// Parse a directive value as a boolean flag.
///
/// Accepts the usual ini spellings (`1`/`0`, `on`/`off`, `true`/`false`,
/// `yes`/`no`), case-insensitively. An empty value is false.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" => Some(true),
        "" | "0" | "off" | "false" | "no" | "none" => Some(false),
        _ => None,
    }
}

//! Collaborators the resolver reads locale data from.
//!
//! Every method is a read of host state at call time. Nothing here caches, so a
//! locale or carrier change on the host is visible to the next resolution.

/// Host locale facility: the user's current language, region and raw
/// identifier (`"fr_FR"`, `"zh_Hant_HK"`).
pub trait SystemLocaleSource: Send + Sync {
    fn language_code(&self) -> Option<String>;

    fn region_code(&self) -> Option<String>;

    /// Raw identifier. An empty string means no identifier is available.
    fn identifier(&self) -> String;
}

/// Region of the active cellular subscription, uppercased.
pub trait CarrierLocaleSource: Send + Sync {
    fn region_code(&self) -> Option<String>;
}

// ---------- Host ----------

/// System locale backed by `sys-locale`, queried on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSystemLocale;

impl HostSystemLocale {
    fn snapshot(&self) -> FixedSystemLocale {
        sys_locale::get_locale()
            .map(|tag| FixedSystemLocale::from_host_tag(&tag))
            .unwrap_or_default()
    }
}

impl SystemLocaleSource for HostSystemLocale {
    fn language_code(&self) -> Option<String> {
        self.snapshot().language
    }

    fn region_code(&self) -> Option<String> {
        self.snapshot().region
    }

    fn identifier(&self) -> String {
        self.snapshot().identifier
    }
}

/// Default variable read by [`EnvCarrierLocale`].
pub const DEFAULT_CARRIER_ENV: &str = "CARRIER_REGION";

/// Carrier region read from an environment variable.
///
/// Desktop hosts have no cellular stack; deployments that know the carrier
/// country export it instead. The value is trimmed and uppercased.
#[derive(Debug, Clone)]
pub struct EnvCarrierLocale {
    var: String,
}

impl EnvCarrierLocale {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvCarrierLocale {
    fn default() -> Self {
        Self::new(DEFAULT_CARRIER_ENV)
    }
}

impl CarrierLocaleSource for EnvCarrierLocale {
    fn region_code(&self) -> Option<String> {
        std::env
            ::var(&self.var)
            .ok()
            .map(|value| value.trim().to_uppercase())
            .filter(|value| !value.is_empty())
    }
}

/// Carrier source for hosts without a subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCarrier;

impl CarrierLocaleSource for NoCarrier {
    fn region_code(&self) -> Option<String> {
        None
    }
}

// ---------- Fixed values ----------

/// System locale with fixed values.
///
/// # Example
///
/// ```rust
/// use bevy_locale::{ FixedSystemLocale, SystemLocaleSource };
///
/// let system = FixedSystemLocale::from_host_tag("zh-Hant-HK");
/// assert_eq!(system.language_code().as_deref(), Some("zh"));
/// assert_eq!(system.region_code().as_deref(), Some("HK"));
/// assert_eq!(system.identifier(), "zh_Hant_HK");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedSystemLocale {
    pub language: Option<String>,
    pub region: Option<String>,
    pub identifier: String,
}

impl FixedSystemLocale {
    pub fn new(language: Option<&str>, region: Option<&str>, identifier: &str) -> Self {
        Self {
            language: language.map(str::to_string),
            region: region.map(str::to_string),
            identifier: identifier.to_string(),
        }
    }

    /// Splits a host locale tag such as `en-US`, `de_DE.UTF-8` or
    /// `sr_RS@latin` into language, region and underscore identifier.
    ///
    /// `C` and `POSIX` carry no locale information and yield an empty value.
    pub fn from_host_tag(tag: &str) -> Self {
        let base = tag.trim().split(['.', '@']).next().unwrap_or_default().trim();
        if base.is_empty() || base == "C" || base == "POSIX" {
            return Self::default();
        }

        let identifier = base.replace('-', "_");
        let subtags: Vec<&str> = identifier.split('_').collect();

        let language = subtags
            .first()
            .filter(|s| (2..=3).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic()))
            .map(|s| s.to_ascii_lowercase());

        let region = subtags
            .last()
            .filter(|_| subtags.len() >= 2)
            .and_then(|s| {
                if s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()) {
                    Some(s.to_ascii_uppercase())
                } else if s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()) {
                    Some(s.to_string())
                } else {
                    None
                }
            });

        Self { language, region, identifier }
    }
}

impl SystemLocaleSource for FixedSystemLocale {
    fn language_code(&self) -> Option<String> {
        self.language.clone()
    }

    fn region_code(&self) -> Option<String> {
        self.region.clone()
    }

    fn identifier(&self) -> String {
        self.identifier.clone()
    }
}

/// Carrier source with a fixed region, reported as given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedCarrierLocale(pub Option<String>);

impl FixedCarrierLocale {
    pub fn new(region: Option<&str>) -> Self {
        Self(region.map(str::to_string))
    }
}

impl CarrierLocaleSource for FixedCarrierLocale {
    fn region_code(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_tags_are_split() {
        let s = FixedSystemLocale::from_host_tag("en-US");
        assert_eq!(s, FixedSystemLocale::new(Some("en"), Some("US"), "en_US"));

        let s = FixedSystemLocale::from_host_tag("de_DE.UTF-8");
        assert_eq!(s, FixedSystemLocale::new(Some("de"), Some("DE"), "de_DE"));

        let s = FixedSystemLocale::from_host_tag("sr_RS@latin");
        assert_eq!(s, FixedSystemLocale::new(Some("sr"), Some("RS"), "sr_RS"));

        let s = FixedSystemLocale::from_host_tag("es-419");
        assert_eq!(s, FixedSystemLocale::new(Some("es"), Some("419"), "es_419"));
    }

    #[test]
    fn language_only_tag_has_no_region() {
        let s = FixedSystemLocale::from_host_tag("fr");
        assert_eq!(s, FixedSystemLocale::new(Some("fr"), None, "fr"));

        let s = FixedSystemLocale::from_host_tag("zh-Hant");
        assert_eq!(s.region, None);
        assert_eq!(s.identifier, "zh_Hant");
    }

    #[test]
    fn posix_locale_is_empty() {
        assert_eq!(FixedSystemLocale::from_host_tag("C"), FixedSystemLocale::default());
        assert_eq!(FixedSystemLocale::from_host_tag("POSIX.UTF-8"), FixedSystemLocale::default());
        assert_eq!(FixedSystemLocale::from_host_tag(""), FixedSystemLocale::default());
    }

    #[test]
    fn env_carrier_uppercases_and_ignores_blank() {
        let var = "BEVY_LOCALE_TEST_CARRIER_SOURCES";
        let carrier = EnvCarrierLocale::new(var);

        unsafe { std::env::set_var(var, " at ") }
        assert_eq!(carrier.region_code().as_deref(), Some("AT"));

        unsafe { std::env::set_var(var, "   ") }
        assert_eq!(carrier.region_code(), None);

        unsafe { std::env::remove_var(var) }
        assert_eq!(carrier.region_code(), None);
    }

    #[test]
    fn no_carrier_is_absent() {
        assert_eq!(NoCarrier.region_code(), None);
        assert_eq!(EnvCarrierLocale::default().var(), DEFAULT_CARRIER_ENV);
    }
}

use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use shelf_metadata::naming::NamingOptions;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::error::{ErrorKind, Result};
use crate::models::{Config, FilterSettings};

/// Environment variables starting with this override file values.
pub const ENV_PREFIX: &str = "SHELF_";

impl Config {
    /// The layered sources, without extracting them.
    ///
    /// The file format follows the extension of `path`; a missing file
    /// contributes nothing.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        debug!(
            library = %config.library_root.display(),
            user = %config.user,
            dry_run = config.dry_run,
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("user"));
        }
        if self.catalog_path.as_os_str().is_empty() || self.catalog_path.is_absolute() {
            exn::bail!(ErrorKind::Invalid("catalog_path"));
        }
        if self.page_concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("page_concurrency"));
        }
        if self.series_concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("series_concurrency"));
        }
        self.filter.validate()
    }

    pub fn naming_options(&self) -> NamingOptions {
        self.naming.into()
    }
}

impl FilterSettings {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("filter.chapter", self.chapter), ("filter.from", self.from), ("filter.to", self.to)] {
            if value.is_some_and(|n| !n.is_finite() || n < 0.0) {
                exn::bail!(ErrorKind::Invalid(field));
            }
        }
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            exn::bail!(ErrorKind::Invalid("filter.from"));
        }
        if let (Some(from), Some(to)) = (self.uploaded_from_millis()?, self.uploaded_to_millis()?)
            && from > to
        {
            exn::bail!(ErrorKind::Invalid("filter.uploaded_from"));
        }
        Ok(())
    }

    /// Lower upload bound in Unix milliseconds.
    pub fn uploaded_from_millis(&self) -> Result<Option<i64>> {
        self.uploaded_from.as_deref().map(|raw| parse_date(raw, "filter.uploaded_from")).transpose()
    }

    /// Upper upload bound in Unix milliseconds.
    pub fn uploaded_to_millis(&self) -> Result<Option<i64>> {
        self.uploaded_to.as_deref().map(|raw| parse_date(raw, "filter.uploaded_to")).transpose()
    }
}

/// Bare dates mean midnight UTC.
fn parse_date(raw: &str, field: &'static str) -> Result<i64> {
    let raw = raw.trim();
    let at = match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
        Ok(date) => date.midnight().assume_utc(),
        Err(_) => OffsetDateTime::parse(raw, &Rfc3339).or_raise(|| ErrorKind::Invalid(field))?,
    };
    Ok((at.unix_timestamp_nanos() / 1_000_000) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NamingSettings, ProcessorSettings};
    use figment::Jail;
    use rstest::rstest;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config.user, "default");
            assert_eq!(config.catalog_path, PathBuf::from("catalog.json"));
            assert!(config.cleanup);
            assert!(!config.dry_run);
            assert_eq!(config.processors, ProcessorSettings { footer: true });
            assert_eq!(config.naming_options(), NamingOptions::default());
            assert_eq!(config.page_concurrency, 4);
            assert_eq!(config.series_concurrency, 1);
            Ok(())
        });
    }

    #[test]
    fn test_file_then_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "shelf.toml",
                r#"
                    user = "alice"
                    library_root = "/srv/comics"
                    page_concurrency = 8

                    [naming]
                    title = true

                    [filter]
                    from = 10.0
                    group = "Ignored"
                "#,
            )?;
            jail.set_env("SHELF_DRY_RUN", "true");
            jail.set_env("SHELF_FILTER__GROUP", "Scans$");
            jail.set_env("SHELF_PROCESSORS__FOOTER", "false");

            let config = Config::load(Some(Path::new("shelf.toml"))).unwrap();
            assert_eq!(config.user, "alice");
            assert_eq!(config.library_root, PathBuf::from("/srv/comics"));
            assert_eq!(config.page_concurrency, 8);
            assert!(config.dry_run);
            assert_eq!(config.naming, NamingSettings { title: true, ..NamingSettings::default() });
            assert_eq!(config.filter.from, Some(10.0));
            assert_eq!(config.filter.group.as_deref(), Some("Scans$"));
            assert!(!config.processors.footer);
            Ok(())
        });
    }

    #[test]
    fn test_yaml_file() {
        Jail::expect_with(|jail| {
            jail.create_file("shelf.yml", "series_concurrency: 3\nfilter:\n  language: English\n")?;
            let config = Config::load(Some(Path::new("shelf.yml"))).unwrap();
            assert_eq!(config.series_concurrency, 3);
            assert_eq!(config.filter.language.as_deref(), Some("English"));
            Ok(())
        });
    }

    #[test]
    fn test_json_file_outside_jail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf.json");
        std::fs::write(&path, r#"{"cleanup": false, "filter": {"chapter": 12.5}}"#).unwrap();
        let config: Config = Config::figment(Some(&path)).unwrap().extract().unwrap();
        assert!(!config.cleanup);
        assert_eq!(config.filter.chapter, Some(12.5));
    }

    #[test]
    fn test_unsupported_format() {
        let err = Config::figment(Some(Path::new("shelf.ini"))).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat("shelf.ini".to_string()));
    }

    #[test]
    fn test_malformed_value() {
        Jail::expect_with(|jail| {
            jail.set_env("SHELF_PAGE_CONCURRENCY", "lots");
            let err = Config::load(None).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }

    #[rstest]
    #[case::no_user(Config { user: " ".into(), ..Config::default() }, "user")]
    #[case::absolute_catalog(Config { catalog_path: "/catalog.json".into(), ..Config::default() }, "catalog_path")]
    #[case::no_pages(Config { page_concurrency: 0, ..Config::default() }, "page_concurrency")]
    #[case::no_series(Config { series_concurrency: 0, ..Config::default() }, "series_concurrency")]
    #[case::negative(Config { filter: FilterSettings { chapter: Some(-1.0), ..FilterSettings::default() }, ..Config::default() }, "filter.chapter")]
    #[case::inverted(Config { filter: FilterSettings { from: Some(5.0), to: Some(2.0), ..FilterSettings::default() }, ..Config::default() }, "filter.from")]
    #[case::bad_date(Config { filter: FilterSettings { uploaded_to: Some("yesterday".into()), ..FilterSettings::default() }, ..Config::default() }, "filter.uploaded_to")]
    #[case::inverted_dates(
        Config {
            filter: FilterSettings {
                uploaded_from: Some("2016-03-14".into()),
                uploaded_to: Some("2016-03-13".into()),
                ..FilterSettings::default()
            },
            ..Config::default()
        },
        "filter.uploaded_from"
    )]
    fn test_validation(#[case] config: Config, #[case] field: &'static str) {
        let err = config.validate().unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid(field));
    }

    #[rstest]
    #[case("2016-03-13", 1_457_827_200_000)]
    #[case(" 2016-03-13 ", 1_457_827_200_000)]
    #[case("2016-03-13T01:00:00+01:00", 1_457_827_200_000)]
    #[case("2016-03-13T00:00:00.250Z", 1_457_827_200_250)]
    fn test_parse_date(#[case] raw: &str, #[case] millis: i64) {
        assert_eq!(parse_date(raw, "field").unwrap(), millis);
    }
}

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use urna_tally::{PercentageScope, ReportRules};

use crate::urna::*;

pub const DEFAULT_BALLOT_LOG: &str = "votos.bin";
pub const DEFAULT_RESULT_FILE: &str = "resultado_votos.txt";
pub const DEFAULT_BOLETIM_FILE: &str = "boletim_urna.txt";

/// The optional JSON configuration file. Every entry may be omitted.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrnaConfig {
    #[serde(rename = "ballotLog")]
    pub ballot_log: Option<String>,
    #[serde(rename = "resultFile")]
    pub result_file: Option<String>,
    #[serde(rename = "boletimFile")]
    pub boletim_file: Option<String>,
    #[serde(rename = "candidatesFile")]
    pub candidates_file: Option<String>,
    #[serde(rename = "votersFile")]
    pub voters_file: Option<String>,
    pub jurisdiction: Option<String>,
    #[serde(rename = "percentageScope")]
    pub percentage_scope: Option<String>,
}

impl UrnaConfig {
    pub fn report_rules(&self) -> UrnaResult<ReportRules> {
        let percentage_scope = match self.percentage_scope.as_deref() {
            None | Some("office") => PercentageScope::Office,
            Some("jurisdictionOffice") => PercentageScope::JurisdictionOffice,
            Some(x) => whatever!("unknown percentage scope: {}", x),
        };
        Ok(ReportRules { percentage_scope })
    }

    /// Makes all the relative paths relative to the given directory instead.
    pub fn resolved_against(self, root: &Path) -> UrnaConfig {
        let resolve = |o: Option<String>| -> Option<String> {
            o.map(|p| {
                let pb: PathBuf = [root, Path::new(&p)].iter().collect();
                pb.display().to_string()
            })
        };
        UrnaConfig {
            ballot_log: resolve(self.ballot_log),
            result_file: resolve(self.result_file),
            boletim_file: resolve(self.boletim_file),
            candidates_file: resolve(self.candidates_file),
            voters_file: resolve(self.voters_file),
            jurisdiction: self.jurisdiction,
            percentage_scope: self.percentage_scope,
        }
    }
}

/// The settings of a session, after applying the defaults.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub ballot_log: String,
    pub result_file: String,
    pub boletim_file: String,
    pub candidates_file: Option<String>,
    pub voters_file: Option<String>,
    pub jurisdiction: Option<String>,
    pub rules: ReportRules,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ballot_log: DEFAULT_BALLOT_LOG.to_string(),
            result_file: DEFAULT_RESULT_FILE.to_string(),
            boletim_file: DEFAULT_BOLETIM_FILE.to_string(),
            candidates_file: None,
            voters_file: None,
            jurisdiction: None,
            rules: ReportRules::DEFAULT_RULES,
        }
    }
}

impl Settings {
    /// Fills the missing entries with the defaults.
    ///
    /// The default ballot log and produced files are placed in `data_dir`. A path given
    /// in the configuration is kept as it is.
    pub fn from_config(config: &UrnaConfig, data_dir: Option<&Path>) -> UrnaResult<Settings> {
        let or_default = |p: &Option<String>, default: &str| -> String {
            match (p, data_dir) {
                (Some(p), _) => p.clone(),
                (None, Some(dir)) => dir.join(default).display().to_string(),
                (None, None) => default.to_string(),
            }
        };
        Ok(Settings {
            ballot_log: or_default(&config.ballot_log, DEFAULT_BALLOT_LOG),
            result_file: or_default(&config.result_file, DEFAULT_RESULT_FILE),
            boletim_file: or_default(&config.boletim_file, DEFAULT_BOLETIM_FILE),
            candidates_file: config.candidates_file.clone(),
            voters_file: config.voters_file.clone(),
            jurisdiction: config.jurisdiction.clone(),
            rules: config.report_rules()?,
        })
    }
}

/// Reads a configuration file. Its relative paths are resolved against its directory.
pub fn read_config(path: &str) -> UrnaResult<UrnaConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: UrnaConfig =
        serde_json::from_str(contents.as_str()).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    Ok(config.resolved_against(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_config_relative_to_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("urna.json");
        fs::write(
            &p,
            r#"{"ballotLog": "data/votos.bin", "candidatesFile": "/abs/candidatos.txt",
                "jurisdiction": "SP", "percentageScope": "jurisdictionOffice"}"#,
        )
        .unwrap();
        let config = read_config(&p.display().to_string()).unwrap();
        assert_eq!(
            config.ballot_log,
            Some(dir.path().join("data/votos.bin").display().to_string())
        );
        assert_eq!(config.candidates_file, Some("/abs/candidatos.txt".to_string()));
        assert_eq!(config.voters_file, None);

        let settings = Settings::from_config(&config, None).unwrap();
        assert_eq!(settings.result_file, DEFAULT_RESULT_FILE);
        assert_eq!(settings.jurisdiction, Some("SP".to_string()));
        assert_eq!(
            settings.rules.percentage_scope,
            PercentageScope::JurisdictionOffice
        );
    }

    #[test]
    fn defaults_in_data_dir() {
        let settings = Settings::from_config(&UrnaConfig::default(), Some(Path::new("/tmp/urna"))).unwrap();
        assert_eq!(settings.ballot_log, "/tmp/urna/votos.bin");
        assert_eq!(settings.boletim_file, "/tmp/urna/boletim_urna.txt");
        assert_eq!(settings.rules, ReportRules::DEFAULT_RULES);
    }

    #[test]
    fn configured_paths_are_not_moved_to_data_dir() {
        let config = UrnaConfig {
            ballot_log: Some("conf/votos.bin".to_string()),
            ..UrnaConfig::default()
        };
        let settings = Settings::from_config(&config, Some(Path::new("out"))).unwrap();
        assert_eq!(settings.ballot_log, "conf/votos.bin");
        assert_eq!(settings.result_file, "out/resultado_votos.txt");
    }

    #[test]
    fn rejects_unknown_scope() {
        let config = UrnaConfig {
            percentage_scope: Some("planet".to_string()),
            ..UrnaConfig::default()
        };
        assert!(matches!(
            Settings::from_config(&config, None),
            Err(UrnaError::Whatever { .. })
        ));
    }

    #[test]
    fn missing_or_invalid_file() {
        assert!(matches!(
            read_config("/nonexistent/urna.json"),
            Err(UrnaError::OpeningConfig { .. })
        ));
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("urna.json");
        fs::write(&p, "{ballotLog").unwrap();
        assert!(matches!(
            read_config(&p.display().to_string()),
            Err(UrnaError::ParsingConfig { .. })
        ));
    }
}

use std::sync::LazyLock;

use anyhow::Context as _;
use geth_harness_config::{ConfigurationError, NodeConfiguration};
use regex::Regex;
use semver::Version;
use tracing::instrument;

use crate::{NodeError, build_command, process::run_to_completion};

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version: (.*)").expect("Invalid version regex"));

/// Queries the version of the configured geth executable.
#[instrument(level = "info", skip_all)]
pub fn geth_version(configuration: &NodeConfiguration) -> Result<Version, NodeError> {
    if configuration.suffix_args.is_some() {
        return Err(ConfigurationError::contradiction(
            "the version of geth can't be queried with `suffix_args` set",
        )
        .into());
    }
    let completed = run_to_completion(
        build_command(&configuration.for_subcommand(["version"]))?,
        None,
    )?
    .check("Error querying the version of geth")?;
    parse_geth_version(&completed.stdout)
}

/// Parses the output of `geth version`, e.g. `Version: 1.14.12-stable`.
pub fn parse_geth_version(output: &str) -> Result<Version, NodeError> {
    let version = VERSION_REGEX
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|version| version.as_str().trim())
        .context("No version found in the output of `geth version`")?;
    Ok(Version::parse(version)
        .with_context(|| format!("Failed to parse the geth version `{version}`"))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_parsed_from_the_output() {
        // Arrange
        let output = "\
Geth
Version: 1.14.12-stable
Git Commit: 293a300d64be3d9a1c2cc92c26fbbba2efac8fa4
Architecture: amd64
Go Version: go1.23.4
";

        // Act
        let version = parse_geth_version(output).expect("Failed to parse");

        // Assert
        assert_eq!(version, Version::parse("1.14.12-stable").unwrap());
        assert!(version > Version::new(1, 14, 0));
    }

    #[test]
    fn outputs_without_a_version_are_rejected() {
        assert!(matches!(
            parse_geth_version("Geth\nArchitecture: amd64"),
            Err(NodeError::Other(_))
        ));
        assert!(parse_geth_version("Version: one.two").is_err());
    }

    #[test]
    fn configurations_with_suffix_args_are_refused() {
        // Arrange
        let configuration = NodeConfiguration {
            suffix_args: Some(vec!["console".into()]),
            ..Default::default()
        };

        // Act
        let result = geth_version(&configuration);

        // Assert
        assert!(matches!(result, Err(NodeError::Configuration(_))));
    }
}

//! Rendering and parsing of the redis.conf artifact.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{Address, ConfigError};

/// Key under which the rendered configuration is stored.
pub const DEFAULT_ARTIFACT_KEY: &str = "redis.conf";

/// Directive that carries the master address.
pub const DEFAULT_ADDRESS_DIRECTIVE: &str = "replicaof";

/// Where the address directive goes relative to the sorted directive block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Before every sorted directive.
    First,

    /// After every sorted directive.
    #[default]
    Last,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Last => f.write_str("last"),
        }
    }
}

impl FromStr for Placement {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            _ => Err(ConfigError::InvalidPlacement(s.to_string())),
        }
    }
}

/// Fixed layout parameters of the rendered artifact.
///
/// These must stay constant for the lifetime of a cluster: changing any of them
/// changes every rendered artifact and triggers a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Store key the artifact is written under.
    pub artifact_key: String,

    /// Keyword of the address directive.
    pub address_directive: String,

    /// Position of the address directive.
    pub address_placement: Placement,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            artifact_key: DEFAULT_ARTIFACT_KEY.to_string(),
            address_directive: DEFAULT_ADDRESS_DIRECTIVE.to_string(),
            address_placement: Placement::default(),
        }
    }
}

/// A rendered configuration blob and the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedArtifact {
    key: String,
    content: String,
}

impl RenderedArtifact {
    /// Wrap existing content, e.g. read back from the store.
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }

    /// Pick the artifact out of a key/text store object.
    pub fn from_data(key: &str, data: &BTreeMap<String, String>) -> Option<Self> {
        data.get(key).map(|content| Self::new(key, content.as_str()))
    }

    /// The store key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The rendered text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true if both artifacts have the same key and byte-identical content.
    pub fn matches(&self, other: &Self) -> bool {
        self.key == other.key && self.content == other.content
    }

    /// SHA-256 of the content, as `sha256:<hex>`.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.content.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// The store data: a single entry mapping the key to the content.
    pub fn into_data(self) -> BTreeMap<String, String> {
        BTreeMap::from([(self.key, self.content)])
    }
}

/// Directives and address recovered from a rendered artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfig {
    /// Directives from the sorted block.
    pub directives: BTreeMap<String, String>,

    /// Address from the address directive, if present at its fixed position.
    pub address: Option<Address>,
}

/// Renders directive mappings into a canonical redis.conf.
#[derive(Debug, Clone, Default)]
pub struct ConfigRenderer {
    options: RenderOptions,
}

impl ConfigRenderer {
    /// Create a renderer with the given layout.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render `directives` and `address` into an artifact.
    ///
    /// Directives are emitted as `<key> <value>` lines sorted byte-wise by key,
    /// never in the iteration order of the input. The address directive is
    /// placed according to [`RenderOptions::address_placement`]. An absent
    /// mapping renders like an empty one; pass `Option<&HashMap<..>>` through
    /// `into_iter().flatten()`.
    ///
    /// Every directive must pass [`check_directive`]: a key with whitespace or a
    /// value with a line break would render lines that [`Self::parse`] reads
    /// back as different directives.
    pub fn render<I, K, V>(&self, directives: I, address: &Address) -> RenderedArtifact
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut sorted: Vec<(K, V)> = directives.into_iter().collect();
        debug_assert!(
            sorted
                .iter()
                .all(|(key, value)| check_directive(key.as_ref(), value.as_ref()).is_ok()),
            "directives must be single-line with whitespace-free keys"
        );
        sorted.sort_by(|(ka, va), (kb, vb)| {
            ka.as_ref()
                .cmp(kb.as_ref())
                .then_with(|| va.as_ref().cmp(vb.as_ref()))
        });

        let address_line = format!(
            "{} {}\n",
            self.options.address_directive,
            address.directive_args()
        );

        let mut content = String::new();
        if self.options.address_placement == Placement::First {
            content.push_str(&address_line);
        }
        for (key, value) in &sorted {
            content.push_str(key.as_ref());
            content.push(' ');
            content.push_str(value.as_ref());
            content.push('\n');
        }
        if self.options.address_placement == Placement::Last {
            content.push_str(&address_line);
        }

        debug!(
            artifact_key = %self.options.artifact_key,
            directives = sorted.len(),
            address = %address,
            "Rendered configuration"
        );

        RenderedArtifact::new(self.options.artifact_key.as_str(), content)
    }

    /// Recover directives and address from a rendered artifact.
    ///
    /// The address is only taken from the configured position; an address
    /// keyword anywhere else is an ordinary directive. Blank lines are skipped.
    pub fn parse(&self, artifact: &RenderedArtifact) -> Result<ParsedConfig, ConfigError> {
        let lines: Vec<&str> = artifact.content().lines().collect();

        let edge = match self.options.address_placement {
            Placement::First => (!lines.is_empty()).then_some(0),
            Placement::Last => lines.len().checked_sub(1),
        };
        let address_line = edge.filter(|&index| {
            lines
                .get(index)
                .and_then(|line| line.split_once(' '))
                .is_some_and(|(keyword, _)| keyword == self.options.address_directive)
        });

        let mut parsed = ParsedConfig::default();
        for (index, &line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));

            if Some(index) == address_line {
                parsed.address = Some(Address::from_directive_args(value)?);
                continue;
            }

            if parsed
                .directives
                .insert(key.to_string(), value.to_string())
                .is_some()
            {
                return Err(ConfigError::DuplicateDirective {
                    line: index + 1,
                    key: key.to_string(),
                });
            }
        }

        Ok(parsed)
    }
}

/// Check that a directive renders as exactly one `<key> <value>` line.
pub fn check_directive(key: &str, value: &str) -> Result<(), ConfigError> {
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidDirective {
            key: key.to_string(),
            reason: "key must be a single word",
        });
    }
    if value.contains(['\n', '\r']) {
        return Err(ConfigError::InvalidDirective {
            key: key.to_string(),
            reason: "value must not contain line breaks",
        });
    }
    Ok(())
}

/// Render with the default layout.
pub fn render<I, K, V>(directives: I, address: &Address) -> RenderedArtifact
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    ConfigRenderer::default().render(directives, address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use proptest::prelude::*;
    use rstest::rstest;

    fn redis_config() -> HashMap<String, String> {
        HashMap::from([
            ("save".to_string(), "60 1000".to_string()),
            ("maxmemory".to_string(), "2gb".to_string()),
            ("timeout".to_string(), "0".to_string()),
        ])
    }

    fn master() -> Address {
        Address::new("192.168.1.100", 6379)
    }

    #[test]
    fn test_render_is_deterministic() {
        let config = redis_config();

        let first = render(&config, &master());
        let second = render(&config, &master());

        assert_eq!(first.content(), second.content());
        assert_eq!(first.key(), DEFAULT_ARTIFACT_KEY);
    }

    #[test]
    fn test_render_sorts_directives() {
        let artifact = render(&redis_config(), &master());

        assert_eq!(
            artifact.content(),
            "maxmemory 2gb\nsave 60 1000\ntimeout 0\nreplicaof 192.168.1.100 6379\n"
        );
    }

    #[test]
    fn test_render_ignores_insertion_order() {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        let pairs = [("a", "1"), ("b", "2"), ("c", "3"), ("appendonly", "yes")];
        for (k, v) in pairs {
            forward.insert(k, v);
        }
        for (k, v) in pairs.iter().rev() {
            backward.insert(*k, *v);
        }

        assert_eq!(render(forward, &master()), render(backward, &master()));
    }

    #[test]
    fn test_sort_is_bytewise() {
        let config = BTreeMap::from([("b", "1"), ("B", "2"), ("a-b", "3"), ("a", "4")]);
        let artifact = render(config, &master());

        let keys: Vec<&str> = artifact
            .content()
            .lines()
            .filter_map(|line| line.split_once(' ').map(|(k, _)| k))
            .collect();
        assert_eq!(keys, vec!["B", "a", "a-b", "b", "replicaof"]);
    }

    #[test]
    fn test_changing_address_only_changes_address_line() {
        let config = redis_config();
        let before = render(&config, &master());
        let after = render(&config, &Address::new("10.0.0.7", 6380));

        let before_lines: Vec<&str> = before.content().lines().collect();
        let after_lines: Vec<&str> = after.content().lines().collect();

        assert_eq!(before_lines.len(), after_lines.len());
        assert_eq!(before_lines[..3], after_lines[..3]);
        assert_eq!(after_lines[3], "replicaof 10.0.0.7 6380");
    }

    #[test]
    fn test_changing_value_only_changes_its_line() {
        let mut config = redis_config();
        let before = render(&config, &master());
        config.insert("save".to_string(), "900 1".to_string());
        let after = render(&config, &master());

        let changed: Vec<(&str, &str)> = before
            .content()
            .lines()
            .zip(after.content().lines())
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(changed, vec![("save 60 1000", "save 900 1")]);
    }

    #[test]
    fn test_absent_config_renders_only_address() {
        let config: Option<&HashMap<String, String>> = None;
        let artifact = render(config.into_iter().flatten(), &master());

        assert_eq!(artifact.content(), "replicaof 192.168.1.100 6379\n");
    }

    #[test]
    fn test_address_first_placement() {
        let renderer = ConfigRenderer::new(RenderOptions {
            artifact_key: "redis.conf".to_string(),
            address_directive: "slaveof".to_string(),
            address_placement: Placement::First,
        });

        let artifact = renderer.render(&redis_config(), &master());
        assert_eq!(
            artifact.content(),
            "slaveof 192.168.1.100 6379\nmaxmemory 2gb\nsave 60 1000\ntimeout 0\n"
        );
    }

    #[test]
    fn test_parse_recovers_input() {
        let renderer = ConfigRenderer::default();
        let artifact = renderer.render(&redis_config(), &master());

        let parsed = renderer.parse(&artifact).unwrap();
        assert_eq!(parsed.address, Some(master()));
        assert_eq!(
            parsed.directives,
            redis_config().into_iter().collect::<BTreeMap<_, _>>()
        );
    }

    #[test]
    fn test_parse_keeps_user_address_keyword_as_directive() {
        let config = BTreeMap::from([("replicaof", "10.9.9.9 6379")]);
        let renderer = ConfigRenderer::default();
        let parsed = renderer.parse(&renderer.render(config, &master())).unwrap();

        assert_eq!(parsed.address, Some(master()));
        assert_eq!(parsed.directives["replicaof"], "10.9.9.9 6379");
    }

    #[test]
    fn test_parse_without_address() {
        let artifact = RenderedArtifact::new(DEFAULT_ARTIFACT_KEY, "maxmemory 2gb\n\ntimeout 0\n");
        let parsed = ConfigRenderer::default().parse(&artifact).unwrap();

        assert_eq!(parsed.address, None);
        assert_eq!(parsed.directives.len(), 2);
    }

    #[test]
    fn test_parse_rejects_duplicates() {
        let artifact = RenderedArtifact::new(DEFAULT_ARTIFACT_KEY, "timeout 0\ntimeout 1\n");
        let err = ConfigRenderer::default().parse(&artifact).unwrap_err();

        assert_eq!(
            err,
            ConfigError::DuplicateDirective {
                line: 2,
                key: "timeout".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let artifact = RenderedArtifact::new(DEFAULT_ARTIFACT_KEY, "replicaof nowhere\n");
        assert!(matches!(
            ConfigRenderer::default().parse(&artifact),
            Err(ConfigError::InvalidAddress(_))
        ));
    }

    #[rstest]
    #[case::plain("save", "60 1000")]
    #[case::empty_value("appendonly", "")]
    #[case::leading_space("dir", " /data")]
    fn test_check_directive_accepts(#[case] key: &str, #[case] value: &str) {
        assert_eq!(check_directive(key, value), Ok(()));
    }

    #[rstest]
    #[case::empty_key("", "1")]
    #[case::spaced_key("max memory", "2gb")]
    #[case::injected_line("save", "60 1000\nreplicaof 1.2.3.4 1")]
    #[case::carriage_return("save", "60 1000\r")]
    fn test_check_directive_rejects(#[case] key: &str, #[case] value: &str) {
        assert!(matches!(
            check_directive(key, value),
            Err(ConfigError::InvalidDirective { .. })
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "single-line")]
    fn test_render_refuses_multiline_value() {
        render([("save", "60 1000\nreplicaof 1.2.3.4 1")], &master());
    }

    #[test]
    fn test_content_hash() {
        let a = render(&redis_config(), &master());
        let b = render(&redis_config(), &Address::new("10.0.0.7", 6379));

        assert_eq!(a.content_hash(), a.clone().content_hash());
        assert_ne!(a.content_hash(), b.content_hash());
        assert!(a.content_hash().starts_with("sha256:"));
        assert_eq!(a.content_hash().len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_store_data_roundtrip() {
        let artifact = render(&redis_config(), &master());
        let data = artifact.clone().into_data();

        assert_eq!(data.len(), 1);
        assert_eq!(
            RenderedArtifact::from_data(DEFAULT_ARTIFACT_KEY, &data),
            Some(artifact)
        );
        assert_eq!(RenderedArtifact::from_data("other.conf", &data), None);
    }

    #[test]
    fn test_placement_from_str() {
        assert_eq!("first".parse::<Placement>().unwrap(), Placement::First);
        assert_eq!("LAST".parse::<Placement>().unwrap(), Placement::Last);
        assert!("middle".parse::<Placement>().is_err());
    }

    fn directives_strategy() -> impl Strategy<Value = HashMap<String, String>> {
        prop::collection::hash_map("[a-z][a-z-]{0,15}", "[a-z0-9 ]{0,20}", 0..12)
    }

    fn address_strategy() -> impl Strategy<Value = Address> {
        ("[a-z0-9.-]{1,20}", any::<u16>()).prop_map(|(host, port)| Address::new(host, port))
    }

    proptest! {
        #[test]
        fn test_render_ignores_map_order(
            config in directives_strategy(),
            address in address_strategy()
        ) {
            let mut pairs: Vec<(&String, &String)> = config.iter().collect();
            pairs.reverse();
            let reordered: HashMap<String, String> =
                pairs.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            prop_assert_eq!(render(&config, &address), render(&reordered, &address));
        }

        #[test]
        fn test_parse_render_roundtrip(
            config in directives_strategy(),
            address in address_strategy(),
            first in any::<bool>()
        ) {
            let renderer = ConfigRenderer::new(RenderOptions {
                address_placement: if first { Placement::First } else { Placement::Last },
                ..RenderOptions::default()
            });

            let parsed = renderer.parse(&renderer.render(&config, &address)).unwrap();
            prop_assert_eq!(parsed.address, Some(address));
            prop_assert_eq!(parsed.directives, config.into_iter().collect::<BTreeMap<_, _>>());
        }
    }
}

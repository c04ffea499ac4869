use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{AppContext, InitArgs},
    core::ldif::{DuplicateDn, LdifOptions, LineEnding, ParseOptions, writer::DEFAULT_FOLD_WIDTH},
};

/// Written at the top of files created by `ldapvi init`.
const HEADER: &str = "\
# ldapvi configuration.
#
# WARNING: bind_pw values are base64-encoded. This only keeps passwords from
# being read over your shoulder; it is NOT secure storage. Keep this file
# private (init creates it with mode 0600) and leave bind_pw out on shared
# machines to be asked for the password each time.
";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Profile used when `--profile` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Directory holding `<unit>.ldif` templates for `new`
    pub templates_dir: PathBuf,

    /// Where drafts are created (system temp directory when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_dir: Option<PathBuf>,

    /// LDIF rendering and parsing
    pub ldif: LdifConfig,

    /// Named connection profiles
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdifConfig
{
    /// Fold lines wider than this many columns; 0 disables folding
    pub fold_width: usize,
    pub line_ending: LineEnding,
    pub duplicate_dn: DuplicateDn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile
{
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_dn: Option<String>,

    /// Base64-encoded password; asked for when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_pw: Option<String>,

    /// Suffix under which units live, e.g. `o=tuna`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<String>,

    pub starttls: bool,
    pub tls_verify: bool,

    /// RDN attribute per unit (`people = "uid"`); others use `cn`
    pub rdn_attributes: BTreeMap<String, String>,
}

impl Default for LdifConfig
{
    fn default() -> Self
    {
        Self {
            fold_width: DEFAULT_FOLD_WIDTH,
            line_ending: LineEnding::default(),
            duplicate_dn: DuplicateDn::default(),
        }
    }
}

impl LdifConfig
{
    pub fn writer_options(&self) -> LdifOptions
    {
        LdifOptions { fold_width: self.fold_width, line_ending: self.line_ending }
    }

    pub fn parse_options(&self) -> ParseOptions
    {
        ParseOptions { duplicate_dn: self.duplicate_dn }
    }
}

impl Default for Profile
{
    fn default() -> Self
    {
        Self {
            uri: None,
            bind_dn: None,
            bind_pw: None,
            base_dn: None,
            starttls: false,
            tls_verify: true,
            rdn_attributes: BTreeMap::new(),
        }
    }
}

impl Profile
{
    /// The stored password, decoded.
    pub fn password(&self) -> Result<Option<String>>
    {
        self.bind_pw
            .as_deref()
            .map(|encoded| {
                let bytes = STANDARD
                    .decode(encoded.trim())
                    .context("bind_pw is not valid base64")?;
                String::from_utf8(bytes).context("bind_pw does not decode to UTF-8")
            })
            .transpose()
    }

    pub fn encode_password(plain: &str) -> String
    {
        STANDARD.encode(plain)
    }
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            default_profile: None,
            templates_dir: PathBuf::from("~/.ldapvi/templates"),
            draft_dir: None,
            ldif: LdifConfig::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config
{
    /// What `ldapvi init` writes: the defaults plus one example profile.
    pub fn starter() -> Self
    {
        let example = Profile {
            uri: Some("ldap://localhost".to_string()),
            bind_dn: Some("cn=admin,dc=example,dc=org".to_string()),
            base_dn: Some("dc=example,dc=org".to_string()),
            rdn_attributes: BTreeMap::from([("people".to_string(), "uid".to_string())]),
            ..Profile::default()
        };

        Self {
            default_profile: Some("example".to_string()),
            profiles: BTreeMap::from([("example".to_string(), example)]),
            ..Self::default()
        }
    }

    /// Look up `name`, or the default profile. With neither configured an
    /// empty profile is returned and everything has to come from flags.
    pub fn profile(
        &self,
        name: Option<&str>,
    ) -> Result<Profile>
    {
        match name.or(self
            .default_profile
            .as_deref())
        {
            Some(name) => self
                .profiles
                .get(name)
                .cloned()
                .with_context(|| format!("No profile named {name:?} in the configuration")),
            None => Ok(Profile::default()),
        }
    }

    pub fn templates_dir(&self) -> PathBuf
    {
        expand(&self.templates_dir)
    }

    pub fn draft_dir(&self) -> Option<PathBuf>
    {
        self.draft_dir
            .as_deref()
            .map(expand)
    }
}

/// Expand a leading `~` in a configured path.
pub fn expand(path: &Path) -> PathBuf
{
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Search order when no `--config` is given.
const CONFIG_PATHS: [&str; 3] = ["ldapvi.toml", ".ldapvi.toml", "~/.ldapvi.toml"];

/// First existing file of [`CONFIG_PATHS`].
fn find_config() -> Option<PathBuf>
{
    CONFIG_PATHS
        .iter()
        .map(|p| expand(Path::new(p)))
        .find(|p| p.is_file())
}

/// The file settings are read from, and saved credentials written to:
/// `--config`, else the first existing search path, else `~/.ldapvi.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf
{
    explicit
        .map(Path::to_path_buf)
        .or_else(find_config)
        .unwrap_or_else(|| expand(Path::new(CONFIG_PATHS[2])))
}

pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
        }
        None =>
        {
            if let Some(path) = find_config()
            {
                builder = builder.add_source(config::File::from(path.as_path()).format(config::FileFormat::Toml));
            }
        }
    }

    // LDAPVI_LDIF__FOLD_WIDTH=0 and friends
    builder = builder.add_source(
        config::Environment::with_prefix("LDAPVI")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("ldapvi.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::starter();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;
    write_private(&config_path, &toml_string)?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

/// Header plus `body`, readable by the owner only.
fn write_private(
    path: &Path,
    body: &str,
) -> Result<()>
{
    std::fs::write(path, format!("{HEADER}\n{body}")).context("Failed to write config file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .context("Failed to restrict config file permissions")?;
    }
    Ok(())
}

/// Save a bind DN, and optionally a password, into `profile` of the file at
/// `path`, creating either when missing. The profile becomes the default one
/// if none is set. Other settings survive; comments besides the header do not.
pub fn store_credentials(
    path: &Path,
    profile: &str,
    bind_dn: &str,
    bind_pw: Option<&str>,
) -> Result<()>
{
    let mut doc: toml::Table = if path.is_file()
    {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?
    }
    else
    {
        toml::Table::new()
    };

    doc.entry("default_profile")
        .or_insert_with(|| toml::Value::String(profile.to_string()));
    let entry = doc
        .entry("profiles")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .context("`profiles` is not a table")?
        .entry(profile)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .with_context(|| format!("profile {profile:?} is not a table"))?;

    entry.insert("bind_dn".to_string(), toml::Value::String(bind_dn.to_string()));
    if let Some(pw) = bind_pw
    {
        entry.insert("bind_pw".to_string(), toml::Value::String(Profile::encode_password(pw)));
    }

    let body = toml::to_string_pretty(&doc).context("Failed to serialize config")?;
    write_private(path, &body)
}

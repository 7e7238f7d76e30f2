//! Deciding which language a file (or a whole tree) is written in.
//!
//! The external classifier is the authority. When it fails or has no opinion about a
//! single file, a fixed extension table takes over. Per-file answers are remembered in
//! a small JSON cache stored inside the working copy's `.git` directory.

use crate::command::{run_checked, CommandRunner, Invocation};
use crate::error::{ChurnError, Result};
use crate::model::LanguageTotals;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const UNKNOWN_LANGUAGE: &str = "unknown";
pub const CACHE_FILE: &str = "langchurn-languages.json";
pub const CONTAINER_MOUNT: &str = "/repo";
pub const DEFAULT_CLASSIFIER: &str = "github-linguist";
pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_IMAGE: &str = "crazymax/linguist:latest";

const EXTENSIONS: &[(&str, &str)] = &[
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("mts", "TypeScript"),
    ("cts", "TypeScript"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("py", "Python"),
    ("pyi", "Python"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("kts", "Kotlin"),
    ("scala", "Scala"),
    ("swift", "Swift"),
    ("m", "Objective-C"),
    ("c", "C"),
    ("h", "C"),
    ("cc", "C++"),
    ("cpp", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("fs", "F#"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("pl", "Perl"),
    ("lua", "Lua"),
    ("dart", "Dart"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("erl", "Erlang"),
    ("hs", "Haskell"),
    ("clj", "Clojure"),
    ("zig", "Zig"),
    ("sh", "Shell"),
    ("bash", "Shell"),
    ("zsh", "Shell"),
    ("ps1", "PowerShell"),
    ("sql", "SQL"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("sass", "Sass"),
    ("less", "Less"),
    ("md", "Markdown"),
    ("mdx", "MDX"),
    ("rst", "reStructuredText"),
    ("adoc", "AsciiDoc"),
    ("txt", "Text"),
    ("json", "JSON"),
    ("yml", "YAML"),
    ("yaml", "YAML"),
    ("toml", "TOML"),
    ("xml", "XML"),
    ("proto", "Protocol Buffer"),
    ("graphql", "GraphQL"),
    ("tf", "HCL"),
    ("nix", "Nix"),
];

const FILENAMES: &[(&str, &str)] = &[
    ("Dockerfile", "Dockerfile"),
    ("Makefile", "Makefile"),
    ("CMakeLists.txt", "CMake"),
    ("Gemfile", "Ruby"),
    ("Rakefile", "Ruby"),
];

/// Language guessed from the file name alone.
pub fn language_for_extension(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if let Some((_, lang)) = FILENAMES.iter().find(|(name, _)| *name == file_name) {
        return Some(*lang);
    }
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

fn amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::Object(map) => map.get("size").or_else(|| map.get("bytes")).and_then(amount),
        _ => None,
    }
}

/// Parse classifier output of the form `{"<Language>": n | {"size": n} | {"bytes": n}}`.
///
/// Entries whose value carries no usable count are dropped; unparseable text yields nothing.
pub fn parse_classifier_json(text: &str) -> LanguageTotals {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) else {
        return LanguageTotals::new();
    };
    map.iter()
        .filter_map(|(lang, v)| amount(v).map(|n| (lang.clone(), n)))
        .collect()
}

/// Language with the largest count; ties go to the alphabetically first name.
pub fn dominant_language(totals: &LanguageTotals) -> Option<String> {
    totals
        .iter()
        .fold(None::<(&str, u64)>, |best, (lang, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((lang, n)),
        })
        .map(|(lang, _)| lang.to_string())
}

/// Read a single-file classification. Accepts the language-to-count shape as well as the
/// per-path breakdown (`{"<path>": {"language": "Rust", ...}}`).
pub fn parse_file_classification(text: &str) -> Option<String> {
    if let Some(lang) = dominant_language(&parse_classifier_json(text)) {
        return Some(lang);
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) else {
        return None;
    };
    map.values()
        .filter_map(|v| v.get("language").and_then(Value::as_str))
        .find(|lang| !lang.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "lowercase")]
pub enum ClassifierEngine {
    Native {
        program: String,
    },
    Container {
        runtime: String,
        image: String,
        program: String,
    },
}

impl ClassifierEngine {
    /// The executable that must be installed for this engine to work.
    pub fn required_tool(&self) -> &str {
        match self {
            ClassifierEngine::Native { program } => program,
            ClassifierEngine::Container { runtime, .. } => runtime,
        }
    }

    fn invocation(&self, dir: &Path, target: Option<&str>) -> Invocation {
        match self {
            ClassifierEngine::Native { program } => {
                let inv = Invocation::new(program.as_str()).current_dir(dir).arg("--json");
                match target {
                    Some(path) => inv.arg(path),
                    None => inv,
                }
            }
            ClassifierEngine::Container {
                runtime,
                image,
                program,
            } => {
                let inv = Invocation::new(runtime.as_str())
                    .args(["run", "--rm", "-v"])
                    .arg(format!("{}:{CONTAINER_MOUNT}", dir.display()))
                    .args(["-w", CONTAINER_MOUNT])
                    .arg(image.as_str())
                    .arg(program.as_str())
                    .arg("--json");
                match target {
                    Some(path) => inv.arg(path),
                    None => inv,
                }
            }
        }
    }
}

impl Default for ClassifierEngine {
    fn default() -> Self {
        ClassifierEngine::Native {
            program: DEFAULT_CLASSIFIER.to_string(),
        }
    }
}

/// Path-to-language answers persisted next to a working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCache {
    entries: BTreeMap<String, String>,
}

impl LanguageCache {
    pub fn location(workdir: &Path) -> PathBuf {
        workdir.join(".git").join(CACHE_FILE)
    }

    /// Missing or unreadable caches load as empty.
    pub async fn load(workdir: &Path) -> Self {
        let path = Self::location(workdir);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), "could not read language cache: {e}");
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), "ignoring corrupt language cache: {e}");
            Self::default()
        })
    }

    pub async fn save(&self, workdir: &Path) -> Result<()> {
        let path = Self::location(workdir);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    pub fn insert(&mut self, path: impl Into<String>, language: impl Into<String>) {
        self.entries.insert(path.into(), language.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Classifier<'r, R> {
    runner: &'r R,
    engine: &'r ClassifierEngine,
}

impl<'r, R: CommandRunner> Classifier<'r, R> {
    pub fn new(runner: &'r R, engine: &'r ClassifierEngine) -> Self {
        Self { runner, engine }
    }

    /// Classify the whole working tree in one invocation. No per-file fallback.
    pub async fn classify_tree(&self, dir: &Path) -> Result<LanguageTotals> {
        let inv = self.engine.invocation(dir, None);
        let out = run_checked(self.runner, &inv)
            .await
            .map_err(|e| ChurnError::Classifier(e.to_string()))?;
        Ok(parse_classifier_json(&out))
    }

    /// Language of one file, falling back to the extension table.
    pub async fn classify_file(&self, dir: &Path, path: &str) -> String {
        let inv = self.engine.invocation(dir, Some(path));
        let detected = match run_checked(self.runner, &inv).await {
            Ok(out) => parse_file_classification(&out),
            Err(e) => {
                debug!(path, "classifier failed, using extension: {e}");
                None
            }
        };
        detected
            .or_else(|| language_for_extension(path).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string())
    }

    /// Like [`Classifier::classify_file`], consulting and extending `cache`.
    pub async fn resolve(&self, dir: &Path, path: &str, cache: &mut LanguageCache) -> String {
        if let Some(lang) = cache.get(path) {
            return lang.to_string();
        }
        let lang = self.classify_file(dir, path).await;
        cache.insert(path, lang.as_str());
        lang
    }
}

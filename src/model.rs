use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const EXACT_PASS_THRESHOLD: f64 = 0.8;
pub const GROUNDED_PASS_THRESHOLD: f64 = 0.9;

/// Keys that belong to a run and must never be persisted with a golden item.
pub const RUN_RESULT_FIELDS: [&str; 8] = [
    "running", "ms", "resp", "exact", "grounded", "cits_ok", "pass", "error",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenItem {
    pub id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expects: Option<Expectations>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GoldenItem {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            expects: None,
            extra: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_expects(mut self, expects: Expectations) -> Self {
        self.expects = Some(expects);
        self
    }

    pub fn strip_run_fields(&mut self) {
        for key in RUN_RESULT_FIELDS {
            self.extra.remove(key);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expectations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub answer_contains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<CitationRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationRule {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RuleKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_include: Vec<String>,
}

impl CitationRule {
    pub fn wanted(&self) -> RuleKind {
        self.kind.unwrap_or(RuleKind::Code)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Code,
    Sql,
    Idl,
    Doc,
    SqlOrCode,
}

impl RuleKind {
    pub fn accepts(self, kind: CitationKind) -> bool {
        match self {
            Self::SqlOrCode => matches!(kind, CitationKind::Sql | CitationKind::Code),
            Self::Code => kind == CitationKind::Code,
            Self::Sql => kind == CitationKind::Sql,
            Self::Idl => kind == CitationKind::Idl,
            Self::Doc => kind == CitationKind::Doc,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Code,
    Sql,
    Idl,
    Doc,
    #[serde(other)]
    Other,
}

impl CitationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Sql => "sql",
            Self::Idl => "idl",
            Self::Doc => "doc",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub kind: CitationKind,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<(u64, u64)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_env: Option<String>,
}

impl Citation {
    #[cfg(test)]
    pub fn new(kind: CitationKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            lines: None,
            repo: None,
            sha: None,
            source_env: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseGraph {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResponse {
    #[serde(default)]
    pub thread_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub final_answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub citations: Vec<Citation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<ResponseGraph>,
    #[serde(
        rename = "raw_state",
        default,
        deserialize_with = "lenient_evidence",
        skip_serializing_if = "SupplementaryEvidence::is_empty"
    )]
    pub evidence: SupplementaryEvidence,
}

impl AnswerResponse {
    #[cfg(test)]
    pub fn new(final_answer: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            final_answer: final_answer.into(),
            citations,
            ..Self::default()
        }
    }
}

/// Retrieved snippets the service exposes next to its answer (`raw_state.hits`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplementaryEvidence {
    #[serde(default)]
    pub hits: Vec<EvidenceHit>,
}

impl SupplementaryEvidence {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceHit {
    #[serde(default)]
    pub text: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_evidence<'de, D>(deserializer: D) -> Result<SupplementaryEvidence, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let hits = raw
        .get("hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| EvidenceHit {
                    text: hit
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(SupplementaryEvidence { hits })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub exact: f64,
    pub cits_ok: bool,
    pub grounded: u8,
}

impl Score {
    pub fn passes(&self) -> bool {
        self.exact >= EXACT_PASS_THRESHOLD
            && self.cits_ok
            && f64::from(self.grounded) >= GROUNDED_PASS_THRESHOLD
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub running: bool,
    pub ms: Option<u64>,
    pub resp: Option<AnswerResponse>,
    pub score: Option<Score>,
    pub pass: Option<bool>,
    pub error: String,
}

impl RunResult {
    pub fn has_run(&self) -> bool {
        self.resp.is_some() || !self.error.is_empty()
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// A failed request never counts as a pass, even if an earlier run did.
    pub fn passed(&self) -> bool {
        !self.is_error() && self.pass.unwrap_or(false)
    }
}

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Counselor persona seeded as the first turn of every new transcript.
pub const DEFAULT_SYSTEM_PROMPT: &str = "너는 감정을 공감하고 위기 상황에 신중히 대응하는 챗봇이야.
사용자의 현재 감정과 시급한 필요를 물어보고, 물리적·심리적 안전 여부를 먼저 확인해.
무리하게 이야기하도록 강요하지 말고, 경청과 공감을 중심으로 대응해.
상담자는 내담자의 자율성과 존엄을 존중해야 하며, 판단이나 강요는 삼가야 해.
사용자가 자살, 자해, 타살, 타해 등을 직·간접적으로 언급할 경우 아래 기관을 안내해줘:
- 생명의 전화 1588-9191 (24시간)
- 보건복지상담센터 129 / www.129.go.kr
- 국가트라우마센터 https://www.nct.go.kr/
- 경기도 정신건강복지센터 031-212-0435
지킬 수 없는 약속은 하지 말고, 쉬운 말로 따뜻하게 설명해줘.";

#[derive(Debug, Clone)]
pub struct CompanionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: String,
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub extraction: ExtractionConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `openai` or `mock`.
    pub provider: String,
    pub api_key: Secret<String>,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Executable launched once per extraction call.
    pub worker_program: String,
    pub worker_args: Vec<String>,
    pub timeout_secs: u64,
    /// Upper bound on worker processes alive at the same time.
    pub max_concurrency: usize,
    pub stopwords_path: PathBuf,
    /// Number of emotion buckets requested from the diary store.
    pub top_emotion_limit: i64,
}

#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub system_prompt: String,
    /// Transcript length past which every append logs a warning.
    pub transcript_warn_turns: usize,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CompanionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let llm_provider = get_env("LLM_PROVIDER", Some("openai"), false)?.to_lowercase();

        Ok(Self {
            common,
            service_name: get_env("SERVICE_NAME", Some("companion-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: get_env("OTLP_ENDPOINT", Some("http://tempo:4317"), false)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 2),
            },
            llm: LlmConfig {
                provider: llm_provider.clone(),
                api_key: Secret::new(if llm_provider == "mock" {
                    get_env("OPENAI_API_KEY", Some(""), false)?
                } else {
                    get_env("OPENAI_API_KEY", None, is_prod)?
                }),
                api_base: get_env("OPENAI_API_BASE", Some("https://api.openai.com/v1"), is_prod)?,
                model: get_env("OPENAI_MODEL", Some("gpt-4o-mini"), is_prod)?,
                timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60),
            },
            extraction: ExtractionConfig {
                worker_program: get_env("EXTRACTION_WORKER_PROGRAM", Some("python3"), is_prod)?,
                worker_args: get_env("EXTRACTION_WORKER_ARGS", Some("extract_words.py"), is_prod)?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                timeout_secs: parse_env("EXTRACTION_TIMEOUT_SECS", 30),
                max_concurrency: parse_env::<usize>("EXTRACTION_MAX_CONCURRENCY", 4).max(1),
                stopwords_path: PathBuf::from(get_env(
                    "STOPWORDS_PATH",
                    Some("korean_stopwords.txt"),
                    false,
                )?),
                top_emotion_limit: parse_env("TOP_EMOTION_LIMIT", 3),
            },
            conversation: ConversationConfig {
                system_prompt: env::var("COMPANION_SYSTEM_PROMPT")
                    .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
                transcript_warn_turns: parse_env("COMPANION_TRANSCRIPT_WARN_TURNS", 200),
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

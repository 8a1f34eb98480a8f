/// Configuration for the frontend application

/// Backend host - 编译时从环境变量读取，默认本地开发地址
/// 生产环境通过 workflow 设置 MARKFLOW_API_BASE 环境变量
pub const API_BASE: &str = match option_env!("MARKFLOW_API_BASE") {
    Some(url) => url,
    None => "http://localhost:8000",
};

/// Versioned REST root the client talks to.
pub fn api_root() -> String {
    markflow_shared::api_root(API_BASE)
}

/// AI models offered when starting a marking job.
pub const MODEL_CHOICES: &[(&str, &str)] = &[
    ("gpt-4o", "GPT-4o"),
    ("gpt-4o-mini", "GPT-4o mini"),
    ("claude-3-5-sonnet", "Claude 3.5 Sonnet"),
];

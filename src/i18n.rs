// ==========================================
// 校务运营管理系统 - 国际化 (i18n)
// ==========================================
// 面向用户的业务提示 (前置条件、参数校验、外部服务失败) 走 rust-i18n
// 词条: locales/zh-CN.yml (默认), locales/en.yml
// rust_i18n::i18n! 宏在 lib.rs 中初始化
// ==========================================

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 支持的语言
pub const SUPPORTED_LOCALES: [&str; 2] = [DEFAULT_LOCALE, "en"];

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换语言
///
/// # 返回
/// - true: 已切换
/// - false: 不支持的语言，保持当前语言不变
pub fn set_locale(locale: &str) -> bool {
    let locale = locale.trim();
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale, "unsupported locale ignored");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译并替换 `%{name}` 占位符
///
/// ```no_run
/// use school_ops::i18n::t_with_args;
/// let msg = t_with_args("lesson.invalid_months", &[("max", "120")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}

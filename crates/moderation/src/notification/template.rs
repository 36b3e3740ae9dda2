//! 通知模板表
//!
//! 模板以 (实体类型, 新状态) 为键，支持 `{{variable}}` 变量替换。
//! 新增可审核实体类型时只需注册模板，工作流引擎无需改动。

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::models::{EntityKind, ModerationStatus};

/// 模板表键：实体类型 + 流转后的状态
type TemplateKey = (EntityKind, ModerationStatus);

/// 通知模板引擎
pub struct TemplateEngine {
    title_templates: HashMap<TemplateKey, String>,
    body_templates: HashMap<TemplateKey, String>,
    /// 变量匹配正则
    variable_regex: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// 创建空的模板引擎
    pub fn new() -> Self {
        Self {
            title_templates: HashMap::new(),
            body_templates: HashMap::new(),
            // 匹配 {{variable_name}} 格式，变量名支持字母、数字、下划线
            variable_regex: Regex::new(r"\{\{(\w+)\}\}").unwrap(),
        }
    }

    /// 创建带有默认模板的引擎
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.register_default_templates();
        engine
    }

    /// 注册默认模板
    ///
    /// 审核结果文案面向实体所有者，待审文案面向 SuperAdmin。
    fn register_default_templates(&mut self) {
        self.register_template(
            EntityKind::Material,
            ModerationStatus::Pending,
            "New Material Awaiting Approval",
            "Material \"{{name}}\" submitted by {{owner}} is awaiting approval.",
        );
        self.register_template(
            EntityKind::Material,
            ModerationStatus::Approved,
            "Material Approved",
            "Your material \"{{name}}\" has been approved by SuperAdmin.",
        );
        self.register_template(
            EntityKind::Material,
            ModerationStatus::Rejected,
            "Material Rejected",
            "Your material \"{{name}}\" has been rejected by SuperAdmin.",
        );

        self.register_template(
            EntityKind::AdminRegistration,
            ModerationStatus::Pending,
            "New Admin Registration",
            "Admin \"{{name}}\" has registered and is awaiting approval.",
        );
        self.register_template(
            EntityKind::AdminRegistration,
            ModerationStatus::Approved,
            "Account Approved",
            "Your admin account \"{{name}}\" has been approved by SuperAdmin.",
        );
        self.register_template(
            EntityKind::AdminRegistration,
            ModerationStatus::Rejected,
            "Account Rejected",
            "Your admin account \"{{name}}\" has been rejected by SuperAdmin.",
        );
    }

    /// 注册模板
    pub fn register_template(
        &mut self,
        kind: EntityKind,
        status: ModerationStatus,
        title_template: impl Into<String>,
        body_template: impl Into<String>,
    ) {
        self.title_templates
            .insert((kind, status), title_template.into());
        self.body_templates
            .insert((kind, status), body_template.into());
    }

    /// 获取模板
    pub fn get_template(
        &self,
        kind: EntityKind,
        status: ModerationStatus,
    ) -> Option<(&str, &str)> {
        let title = self.title_templates.get(&(kind, status))?;
        let body = self.body_templates.get(&(kind, status))?;
        Some((title, body))
    }

    /// 渲染单个模板
    ///
    /// 将模板中的 `{{variable}}` 替换为变量表中的对应值。
    /// 未找到的变量会保留原样并记录警告日志。
    pub fn render(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let result = self
            .variable_regex
            .replace_all(template, |caps: &regex::Captures| {
                let var_name = &caps[1];
                match vars.get(var_name) {
                    Some(value) => value.clone(),
                    None => {
                        warn!(variable = var_name, "模板变量未找到，保留原样");
                        caps[0].to_string()
                    }
                }
            });

        result.into_owned()
    }

    /// 渲染标题和正文
    ///
    /// 没有注册对应模板时返回 None，由调用方决定降级策略。
    pub fn render_notification(
        &self,
        kind: EntityKind,
        status: ModerationStatus,
        vars: &HashMap<String, String>,
    ) -> Option<(String, String)> {
        let (title_template, body_template) = self.get_template(kind, status)?;

        let title = self.render(title_template, vars);
        let body = self.render(body_template, vars);

        Some((title, body))
    }

    /// 提取模板中的所有变量名
    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        self.variable_regex
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

use serde::{Deserialize, Serialize};

use crate::schedule::model::{lenient_label, lenient_text, lenient_value};

const MISSING_RULE_BODY: &str =
    "This rule has no description yet. Ask a staff member if you are unsure what it means.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulesDocument {
    #[serde(default, deserialize_with = "lenient_value")]
    pub meta: Option<RulesMeta>,
    #[serde(default)]
    pub sections: Vec<RuleSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesMeta {
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applies_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSection {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesView {
    pub last_updated: Option<String>,
    pub applies_to: Option<String>,
    pub nav: Vec<NavEntry>,
    pub sections: Vec<RuleSectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavEntry {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleSectionView {
    pub id: String,
    pub heading: String,
    pub rules: Vec<RuleView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleView {
    pub title: String,
    pub body: String,
}

pub fn rules_view(document: &RulesDocument) -> RulesView {
    let meta = document.meta.clone().unwrap_or_default();
    let mut nav = Vec::with_capacity(document.sections.len());
    let mut sections = Vec::with_capacity(document.sections.len());

    for (index, section) in document.sections.iter().enumerate() {
        let position = index + 1;
        let id = section
            .id
            .clone()
            .unwrap_or_else(|| format!("rules-section-{position}"));
        let number = section
            .number
            .clone()
            .unwrap_or_else(|| position.to_string());
        let title = section
            .title
            .clone()
            .unwrap_or_else(|| format!("Section {number}"));
        let heading = format!("{number}. {title}");

        nav.push(NavEntry {
            href: format!("#{id}"),
            text: heading.clone(),
        });

        let rules = section
            .rules
            .iter()
            .enumerate()
            .map(|(rule_index, rule)| RuleView {
                title: rule
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Rule {number}.{}", rule_index + 1)),
                body: rule
                    .body
                    .clone()
                    .unwrap_or_else(|| MISSING_RULE_BODY.to_string()),
            })
            .collect();

        sections.push(RuleSectionView { id, heading, rules });
    }

    RulesView {
        last_updated: meta.last_updated,
        applies_to: meta.applies_to,
        nav,
        sections,
    }
}

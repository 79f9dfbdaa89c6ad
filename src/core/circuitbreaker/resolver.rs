use super::{BlockConfig, MatchString, RegexCache, Rule, SourceMatcher};
use crate::base::{Resource, ServiceKey};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;

/// `MatchPrecedence` decides which rule wins when several rules match a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPrecedence {
    /// the first matching rule in declared order
    FirstMatch,
    /// rules with a method pattern, then rules with a source, win over broader ones,
    /// ties are broken by declared order
    MostSpecific,
}

impl Default for MatchPrecedence {
    fn default() -> MatchPrecedence {
        MatchPrecedence::FirstMatch
    }
}

/// `RuleResolver` picks the rule governing a resource.
#[derive(Debug)]
pub struct RuleResolver {
    regexes: Arc<RegexCache>,
    precedence: MatchPrecedence,
}

impl RuleResolver {
    pub fn new(regexes: Arc<RegexCache>, precedence: MatchPrecedence) -> Self {
        RuleResolver {
            regexes,
            precedence,
        }
    }

    pub fn precedence(&self) -> MatchPrecedence {
        self.precedence
    }

    pub fn regexes(&self) -> &Arc<RegexCache> {
        &self.regexes
    }

    /// `resolve` returns the rule governing calls from `caller` to `resource`, if any.
    pub fn resolve(
        &self,
        resource: &Resource,
        caller: Option<&ServiceKey>,
        rules: &[Arc<Rule>],
    ) -> Option<Arc<Rule>> {
        let mut candidates = rules
            .iter()
            .filter(|rule| self.is_applicable(rule, resource, caller));
        match self.precedence {
            MatchPrecedence::FirstMatch => candidates.next().cloned(),
            // `min_by_key` keeps the first of equal elements
            MatchPrecedence::MostSpecific => candidates
                .min_by_key(|rule| Reverse(specificity(rule)))
                .cloned(),
        }
    }

    /// `is_applicable` checks whether the rule matches the resource and the caller.
    pub fn is_applicable(&self, rule: &Rule, resource: &Resource, caller: Option<&ServiceKey>) -> bool {
        if !rule.enable || rule.level != resource.level() {
            return false;
        }
        let destination = &rule.rule_matcher.destination;
        let service = resource.service_key();
        if !name_matches(&destination.namespace, &service.namespace)
            || !name_matches(&destination.service, &service.service)
        {
            return false;
        }
        if !source_matches(&rule.rule_matcher.source, caller) {
            return false;
        }
        match (&destination.method, resource.path()) {
            (Some(method), Some(path)) => method.matches(path, &self.regexes),
            _ => true,
        }
    }

    /// `active_block_configs` returns the block configs of the rule guarding the resource,
    /// the API scope of a block config only narrows method resources.
    pub fn active_block_configs<'a>(&self, rule: &'a Rule, resource: &Resource) -> Vec<&'a BlockConfig> {
        rule.block_configs
            .iter()
            .filter(|config| match (&config.api, resource.path()) {
                (Some(api), Some(path)) => api.matches(path, &self.regexes),
                _ => true,
            })
            .collect()
    }
}

fn name_matches(pattern: &str, name: &str) -> bool {
    utils::is_wildcard(pattern) || pattern == name
}

fn source_matches(source: &SourceMatcher, caller: Option<&ServiceKey>) -> bool {
    match caller {
        Some(caller) => {
            name_matches(&source.namespace, &caller.namespace)
                && name_matches(&source.service, &caller.service)
        }
        None => utils::is_wildcard(&source.namespace) && utils::is_wildcard(&source.service),
    }
}

fn is_specific(pattern: Option<&MatchString>) -> bool {
    pattern.map_or(false, |p| !utils::is_wildcard(&p.value))
}

fn specificity(rule: &Rule) -> u8 {
    let mut score = 0;
    if is_specific(rule.rule_matcher.destination.method.as_ref()) {
        score += 2;
    }
    let source = &rule.rule_matcher.source;
    if !utils::is_wildcard(&source.namespace) || !utils::is_wildcard(&source.service) {
        score += 1;
    }
    score
}

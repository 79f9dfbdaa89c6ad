use super::Rule;
use crate::base::ServiceKey;
use crate::{logging, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// `ServiceRules` is the rule set of a destination service, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRules {
    pub revision: String,
    pub rules: Vec<Arc<Rule>>,
}

/// `RuleSource` provides the circuit breaking rules per destination service.
pub trait RuleSource: Send + Sync {
    /// `rules_of` returns the current rule set of the service, `None` if it has none.
    fn rules_of(&self, service: &ServiceKey) -> Option<Arc<ServiceRules>>;
}

/// `RuleChangeListener` is notified when the rule set of a service changes.
pub trait RuleChangeListener: Send + Sync {
    fn on_rule_changed(
        &self,
        service: &ServiceKey,
        old: Option<Arc<ServiceRules>>,
        new: Option<Arc<ServiceRules>>,
    );
}

/// `InMemoryRuleSource` keeps the rule sets loaded by the application or a data source adapter.
#[derive(Default)]
pub struct InMemoryRuleSource {
    rules: RwLock<HashMap<ServiceKey, Arc<ServiceRules>>>,
    listeners: RwLock<Vec<Arc<dyn RuleChangeListener>>>,
}

impl std::fmt::Debug for InMemoryRuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRuleSource")
            .field("rules", &self.rules)
            .field("listeners", &self.listeners.read().unwrap().len())
            .finish()
    }
}

impl InMemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn RuleChangeListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    /// `load_rules` replaces the rule set of the service with the given rules.
    /// Invalid rules are neglected.
    /// The returned `bool` indicates whether the rule set has been changed,
    /// every change gets a new revision and is notified to the listeners.
    // This func acquires the write lock of the rule sets, and calls the listeners after releasing it
    pub fn load_rules(&self, service: ServiceKey, rules: Vec<Arc<Rule>>) -> Result<bool> {
        let mut valid_rules = Vec::with_capacity(rules.len());
        for rule in rules {
            match rule.is_valid() {
                Ok(_) => valid_rules.push(rule),
                Err(err) => logging::warn!(
                    "[CircuitBreaker InMemoryRuleSource] Ignoring invalid circuit breaking rule {:?} of {}, reason: {:?}",
                    rule.name,
                    service,
                    err
                ),
            }
        }

        let (old, new) = {
            let mut rule_map = self.rules.write().unwrap();
            let old = rule_map.get(&service).cloned();
            let unchanged = match &old {
                Some(old) => old.rules == valid_rules,
                None => valid_rules.is_empty(),
            };
            if unchanged {
                logging::info!(
                    "[CircuitBreaker InMemoryRuleSource] Loaded rules of {} is the same with current rules, so ignore load operation.",
                    service
                );
                return Ok(false);
            }
            let revision = uuid::Uuid::new_v4().to_string();
            let new = if valid_rules.is_empty() {
                rule_map.remove(&service);
                None
            } else {
                let rules = valid_rules
                    .into_iter()
                    .map(|rule| {
                        let mut rule = (*rule).clone();
                        rule.revision = revision.clone();
                        Arc::new(rule)
                    })
                    .collect();
                let new = Arc::new(ServiceRules {
                    revision: revision.clone(),
                    rules,
                });
                rule_map.insert(service.clone(), Arc::clone(&new));
                Some(new)
            };
            (old, new)
        };
        logging::info!(
            "[CircuitBreaker InMemoryRuleSource] Circuit breaking rules of {} were loaded: {:?}",
            service,
            new.as_ref().map(|r| r.rules.iter().map(|r| r.name.clone()).collect::<Vec<_>>())
        );
        self.notify(&service, old, new);
        Ok(true)
    }

    /// `clear_rules_of` removes the rule set of the service.
    pub fn clear_rules_of(&self, service: &ServiceKey) -> bool {
        let old = self.rules.write().unwrap().remove(service);
        if old.is_none() {
            return false;
        }
        self.notify(service, old, None);
        true
    }

    /// `get_rules` returns the rules of the service
    pub fn get_rules(&self, service: &ServiceKey) -> Vec<Arc<Rule>> {
        self.rules
            .read()
            .unwrap()
            .get(service)
            .map(|r| r.rules.clone())
            .unwrap_or_default()
    }

    fn notify(
        &self,
        service: &ServiceKey,
        old: Option<Arc<ServiceRules>>,
        new: Option<Arc<ServiceRules>>,
    ) {
        let listeners = self.listeners.read().unwrap().clone();
        for listener in listeners {
            listener.on_rule_changed(service, old.clone(), new.clone());
        }
    }
}

impl RuleSource for InMemoryRuleSource {
    fn rules_of(&self, service: &ServiceKey) -> Option<Arc<ServiceRules>> {
        self.rules.read().unwrap().get(service).cloned()
    }
}

#[cfg(test)]
pub(crate) use test::MockSource;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceState {
    Idle,
    Created,
    Ready,
    Failed,
    Terminated,
}

pub fn valid_state_transition(src: &ServiceState, dst: &ServiceState) -> bool {
    let state_transition_map: HashMap<ServiceState, Vec<ServiceState>> = {
        let mut map = HashMap::new();
        map.insert(ServiceState::Idle, vec![ServiceState::Created]);
        map.insert(
            ServiceState::Created,
            vec![
                ServiceState::Ready,
                ServiceState::Failed,
                ServiceState::Terminated,
            ],
        );
        map.insert(ServiceState::Ready, vec![ServiceState::Terminated]);
        map.insert(ServiceState::Failed, vec![ServiceState::Terminated]);
        map.insert(ServiceState::Terminated, vec![ServiceState::Created]);
        map
    };

    if let Some(valid_states) = state_transition_map.get(src) {
        valid_states.contains(dst)
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ServiceState::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(valid_state_transition(&Idle, &Created));
        assert!(valid_state_transition(&Created, &Ready));
        assert!(valid_state_transition(&Ready, &Terminated));
    }

    #[test]
    fn test_failure_path_transitions() {
        assert!(valid_state_transition(&Created, &Failed));
        assert!(valid_state_transition(&Failed, &Terminated));
    }

    #[test]
    fn test_rerun_after_terminate() {
        assert!(valid_state_transition(&Terminated, &Created));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!valid_state_transition(&Idle, &Ready));
        assert!(!valid_state_transition(&Idle, &Terminated));
        assert!(!valid_state_transition(&Ready, &Created));
        assert!(!valid_state_transition(&Failed, &Ready));
        assert!(!valid_state_transition(&Terminated, &Terminated));
    }
}

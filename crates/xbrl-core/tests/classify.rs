use proptest::prelude::*;
use xbrl_core::{Classifier, is_generic_code};
use xbrl_model::{Category, RawEvent, Severity};

fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("unknown".to_string()),
        Just("message:v4460_m_0".to_string()),
        Just("xbrldie:PrimaryItemDimensionallyInvalidError".to_string()),
        Just("fi:presence".to_string()),
        "[a-zA-Z0-9:._-]{0,24}",
    ]
}

proptest! {
    #[test]
    fn every_event_gets_exactly_one_category(
        code in code_strategy(),
        message in "\\PC{0,60}",
        refs in proptest::collection::vec("[a-z/._0-9]{0,20}", 0..3),
    ) {
        let event = RawEvent::new(code.clone(), message.clone(), Severity::Error).with_refs(refs.clone());
        let category = Classifier::default().classify(&event);
        prop_assert!(Category::ALL.contains(&category));

        let blank = is_generic_code(&code)
            && message.trim().is_empty()
            && refs.iter().all(|r| r.trim().is_empty());
        prop_assert_eq!(category == Category::Unknown, blank);
    }
}

#[test]
fn unmatched_events_fall_back_to_xbrl21() {
    let event = RawEvent::new("xbrl.3.5.3.9.2", "Locator href is not valid", Severity::Error);
    assert_eq!(Classifier::default().classify(&event), Category::Xbrl21);
}

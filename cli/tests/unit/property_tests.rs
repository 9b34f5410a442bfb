//! Property tests for the pure VM checks.

use proptest::prelude::*;
use vmprobe::domain::vm::{compare_image, is_nic_attached, nic_resource_id};
use vmprobe::domain::{ExpectedImage, ImageReference};

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

fn guid() -> impl Strategy<Value = String> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
}

proptest! {
    /// The NIC's own id is always found among ids that contain it.
    #[test]
    fn prop_nic_id_found_wherever_it_sits(
        sub in guid(),
        rg in name(),
        nic in name(),
        others in proptest::collection::vec(name(), 0..5),
        position in 0usize..6,
    ) {
        let expected = nic_resource_id(&sub, &rg, &nic);
        let mut ids: Vec<String> = others
            .iter()
            .filter(|o| **o != nic)
            .map(|o| nic_resource_id(&sub, &rg, o))
            .collect();
        let at = position.min(ids.len());
        ids.insert(at, expected.clone());
        prop_assert!(is_nic_attached(&ids, &expected));
    }

    /// Ids of other NICs never count, including prefixes of the expected name.
    #[test]
    fn prop_other_nics_never_match(
        sub in guid(),
        rg in name(),
        nic in name(),
        suffix in "[a-z0-9]{1,4}",
    ) {
        let expected = nic_resource_id(&sub, &rg, &nic);
        let ids = vec![
            nic_resource_id(&sub, &rg, &format!("{nic}{suffix}")),
            format!("{expected}/ipConfigurations/ipconfig1"),
        ];
        prop_assert!(!is_nic_attached(&ids, &expected));
    }

    /// An image reference built from the expectation always matches,
    /// whatever its version.
    #[test]
    fn prop_matching_image_has_no_mismatches(
        publisher in name(),
        offer in name(),
        sku in name(),
        version in proptest::option::of(name()),
    ) {
        let expected = ExpectedImage { publisher: publisher.clone(), offer: offer.clone(), sku: sku.clone() };
        let actual = ImageReference {
            publisher: Some(publisher),
            offer: Some(offer),
            sku: Some(sku),
            version,
        };
        prop_assert!(compare_image(&actual, &expected).is_empty());
    }

    /// Every differing field is reported exactly once.
    #[test]
    fn prop_each_differing_field_is_reported(
        differ in proptest::array::uniform3(any::<bool>()),
    ) {
        let expected = ExpectedImage::default();
        let pick = |changed: bool, value: &str| {
            Some(if changed { format!("{value}-other") } else { value.to_string() })
        };
        let actual = ImageReference {
            publisher: pick(differ[0], &expected.publisher),
            offer: pick(differ[1], &expected.offer),
            sku: pick(differ[2], &expected.sku),
            version: None,
        };
        let mismatches = compare_image(&actual, &expected);
        prop_assert_eq!(mismatches.len(), differ.iter().filter(|d| **d).count());
    }
}

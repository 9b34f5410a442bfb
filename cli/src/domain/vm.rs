//! Virtual machine descriptors and the pure checks run against them.
//!
//! Pure functions only: no I/O, no async.

use std::fmt;

// ── Constants ────────────────────────────────────────────────────────────────

/// Image publisher the VM is expected to run.
pub const UBUNTU_PUBLISHER: &str = "Canonical";
/// Image offer for Ubuntu Server 22.04 (Jammy).
pub const UBUNTU_JAMMY_OFFER: &str = "0001-com-ubuntu-server-jammy";
/// Image SKU for Ubuntu 22.04 LTS Gen2, as declared in `main.tf`.
pub const UBUNTU_JAMMY_SKU: &str = "22_04-lts-gen2";

// ── Types ────────────────────────────────────────────────────────────────────

/// Marketplace image reference of a VM's OS disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReference {
    pub publisher: Option<String>,
    pub offer: Option<String>,
    pub sku: Option<String>,
    pub version: Option<String>,
}

/// The subset of a VM's live state the scenarios inspect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmDescriptor {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Resource ids of attached network interfaces.
    pub network_interface_ids: Vec<String>,
    pub image_reference: ImageReference,
}

/// Image fields the VM must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedImage {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
}

impl Default for ExpectedImage {
    fn default() -> Self {
        Self {
            publisher: UBUNTU_PUBLISHER.to_string(),
            offer: UBUNTU_JAMMY_OFFER.to_string(),
            sku: UBUNTU_JAMMY_SKU.to_string(),
        }
    }
}

/// An image field that differs from the expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMismatch {
    pub field: ImageField,
    pub expected: String,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField {
    Publisher,
    Offer,
    Sku,
}

impl fmt::Display for ImageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Publisher => "publisher",
            Self::Offer => "offer",
            Self::Sku => "sku",
        })
    }
}

impl fmt::Display for ImageMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VM image {} is {}, expected '{}'",
            self.field,
            self.actual
                .as_deref()
                .map_or_else(|| "unset".to_string(), |a| format!("'{a}'")),
            self.expected
        )
    }
}

// ── Checks ───────────────────────────────────────────────────────────────────

/// Build the ARM resource id of a network interface.
#[must_use]
pub fn nic_resource_id(subscription: &str, resource_group: &str, nic_name: &str) -> String {
    format!(
        "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.Network/networkInterfaces/{nic_name}"
    )
}

/// Whether `expected_id` is one of the VM's attached interface ids.
///
/// Exact set membership: prefixes and substrings do not count.
#[must_use]
pub fn is_nic_attached(attached_ids: &[String], expected_id: &str) -> bool {
    attached_ids.iter().any(|id| id == expected_id)
}

/// Compare publisher, offer and sku for exact equality.
///
/// Returns one entry per mismatched field, in publisher/offer/sku order.
#[must_use]
pub fn compare_image(actual: &ImageReference, expected: &ExpectedImage) -> Vec<ImageMismatch> {
    [
        (ImageField::Publisher, &actual.publisher, &expected.publisher),
        (ImageField::Offer, &actual.offer, &expected.offer),
        (ImageField::Sku, &actual.sku, &expected.sku),
    ]
    .into_iter()
    .filter(|(_, actual, expected)| actual.as_deref() != Some(expected.as_str()))
    .map(|(field, actual, expected)| ImageMismatch {
        field,
        expected: expected.clone(),
        actual: actual.clone(),
    })
    .collect()
}

// ── Unit tests ───────────────────────────────────────────────────────────────

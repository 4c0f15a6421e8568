// file: src/vbox/types.rs
// version: 1.0.0
// guid: 7b19e3d6-48a0-4c5f-b2e7-0a6d94c1f835

//! Value types passed to VBoxManage

use serde::{Deserialize, Serialize};

/// Name of the IDE controller added by [`crate::vbox::VBoxManage::ensure_ide`]
pub const IDE_CONTROLLER: &str = "ide0";

/// Name of the floppy controller added by
/// [`crate::vbox::VBoxManage::ensure_floppy_controller`]
pub const FLOPPY_CONTROLLER: &str = "floppy0";

/// Key prefix of the storage controller lines in `showvminfo` output
pub const STORAGE_CONTROLLER_NAME_PREFIX: &str = "Storage Controller Name ";

/// Network adapter hardware models accepted by `modifyvm --nictype<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NicType {
    /// AMD PCnet-PCI II
    #[serde(rename = "Am79C970A")]
    PcnetPci2,
    /// AMD PCnet-FAST III
    #[serde(rename = "Am79C973")]
    PcnetFast3,
    /// AMD PCnet-ISA/VLB
    #[serde(rename = "Am79C960")]
    PcnetIsa,
    /// Intel PRO/1000 MT Desktop
    #[serde(rename = "82540EM")]
    IntelProDesktop,
    /// Intel PRO/1000 T Server
    #[serde(rename = "82543GC")]
    IntelProT,
    /// Intel PRO/1000 MT Server
    #[serde(rename = "82545EM")]
    IntelProServer,
    /// Paravirtualized network adapter
    #[serde(rename = "virtio")]
    Virtio,
}

impl NicType {
    pub const ALL: [NicType; 7] = [
        NicType::PcnetPci2,
        NicType::PcnetFast3,
        NicType::PcnetIsa,
        NicType::IntelProDesktop,
        NicType::IntelProT,
        NicType::IntelProServer,
        NicType::Virtio,
    ];

    /// Get the value VBoxManage expects on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            NicType::PcnetPci2 => "Am79C970A",
            NicType::PcnetFast3 => "Am79C973",
            NicType::PcnetIsa => "Am79C960",
            NicType::IntelProDesktop => "82540EM",
            NicType::IntelProT => "82543GC",
            NicType::IntelProServer => "82545EM",
            NicType::Virtio => "virtio",
        }
    }
}

impl std::fmt::Display for NicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NicType {
    type Err = crate::error::VBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NicType::ALL
            .into_iter()
            .find(|nic| nic.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                crate::error::VBoxError::validation(format!("Unknown NIC type: {}", s))
            })
    }
}

/// Things `VBoxManage list` can enumerate
pub struct ListKind;

impl ListKind {
    pub const OSTYPES: &'static str = "ostypes";
    pub const VMS: &'static str = "vms";
    pub const RUNNING_VMS: &'static str = "runningvms";
    pub const HDDS: &'static str = "hdds";
    pub const DVDS: &'static str = "dvds";
    pub const FLOPPIES: &'static str = "floppies";
    pub const HOST_INFO: &'static str = "hostinfo";
}

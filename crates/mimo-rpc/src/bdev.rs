//! Block device operations
//!
//! Each method validates its arguments, assembles the wire parameters, invokes the
//! daemon through the shared [`RpcConnection`], and decodes the result into a
//! [`serde_json::Value`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::connection::RpcConnection;
use crate::error::{BdevError, ClientError};
use crate::params;
use crate::params::Params;

/// Transport type used when the caller does not name one
pub const DEFAULT_NVME_TRTYPE: &str = "PCIe";

/// Request body for `bdev_raid_create`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateRaidBdevRequest {
    pub name: String,
    pub raid_level: String,
    pub base_bdevs: Vec<String>,
    /// Omitted from the request when zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_size_kb: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub superblock: bool,
}

/// Split a single space-joined entry into separate device names.
///
/// Only a list of exactly one entry containing a space is re-split; longer lists are
/// returned unchanged even if their entries contain spaces.
pub fn normalize_base_bdevs(base_bdevs: &[String]) -> Vec<String> {
    match base_bdevs {
        [single] if single.contains(' ') => {
            single.split_whitespace().map(String::from).collect()
        }
        _ => base_bdevs.to_vec(),
    }
}

/// Number of blocks for a device of `total_size_mb` MiB
pub fn malloc_num_blocks(total_size_mb: f64, block_size: u32) -> u64 {
    (total_size_mb * 1024.0 * 1024.0 / f64::from(block_size)).floor() as u64
}

fn decode(bytes: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice(bytes).map_err(|e| ClientError::Decode(Arc::new(e)))
}

#[derive(Debug, Clone)]
pub struct BdevService {
    conn: Arc<RpcConnection>,
}

impl BdevService {
    pub fn new(conn: Arc<RpcConnection>) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Arc<RpcConnection> {
        &self.conn
    }

    async fn call_rpc(
        &self,
        operation: &'static str,
        method: &str,
        params: Params,
    ) -> Result<Value, BdevError> {
        debug!(operation, method, "Invoking daemon");
        let bytes = self
            .conn
            .invoke(method, params)
            .await
            .map_err(|source| BdevError { operation, source })?;
        decode(&bytes).map_err(|source| BdevError { operation, source })
    }

    /// List block devices.
    ///
    /// An empty or absent `name` lists every device. `timeout_ms` of zero is not sent.
    pub async fn get_bdevs(
        &self,
        name: Option<&str>,
        timeout_ms: Option<u64>,
    ) -> Result<Value, BdevError> {
        let params = params! {
            "name" => name,
            "timeout_ms" => timeout_ms.filter(|t| *t > 0),
        };
        self.call_rpc("get bdev", "bdev_get_bdevs", params).await
    }

    /// Attach an NVMe controller. Result is the list of created bdev names.
    pub async fn attach_nvme_controller(
        &self,
        name: &str,
        trtype: &str,
        traddr: &str,
    ) -> Result<Value, BdevError> {
        const OPERATION: &str = "attach NVMe controller";

        let missing: Vec<&'static str> = [("name", name), ("trtype", trtype), ("traddr", traddr)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(BdevError {
                operation: OPERATION,
                source: ClientError::validation(missing, "name, trtype, and traddr are required"),
            });
        }

        let params = params! {
            "name" => name,
            "trtype" => trtype,
            "traddr" => traddr,
        };
        self.call_rpc(OPERATION, "bdev_nvme_attach_controller", params)
            .await
    }

    /// [`attach_nvme_controller`](Self::attach_nvme_controller) over PCIe
    pub async fn attach_nvme_pcie_controller(
        &self,
        name: &str,
        traddr: &str,
    ) -> Result<Value, BdevError> {
        self.attach_nvme_controller(name, DEFAULT_NVME_TRTYPE, traddr)
            .await
    }

    /// Create a memory-backed bdev of `total_size_mb` MiB. Result is the bdev name.
    pub async fn create_malloc_bdev(
        &self,
        name: Option<&str>,
        uuid: Option<&str>,
        total_size_mb: f64,
        block_size: u32,
    ) -> Result<Value, BdevError> {
        const OPERATION: &str = "create malloc bdev";

        let size_valid = total_size_mb.is_finite() && total_size_mb > 0.0;
        if !size_valid || block_size == 0 {
            let mut fields = Vec::new();
            if !size_valid {
                fields.push("total_size");
            }
            if block_size == 0 {
                fields.push("block_size");
            }
            return Err(BdevError {
                operation: OPERATION,
                source: ClientError::validation(
                    fields,
                    "total_size and block_size must be positive",
                ),
            });
        }

        let params = params! {
            "name" => name,
            "uuid" => uuid,
            "block_size" => block_size,
            "num_blocks" => malloc_num_blocks(total_size_mb, block_size),
        };
        self.call_rpc(OPERATION, "bdev_malloc_create", params).await
    }

    /// Create a RAID bdev. Result is the RAID bdev name.
    pub async fn create_raid_bdev(&self, req: &CreateRaidBdevRequest) -> Result<Value, BdevError> {
        const OPERATION: &str = "create RAID bdev";

        let mut missing = Vec::new();
        if req.name.is_empty() {
            missing.push("name");
        }
        if req.raid_level.is_empty() {
            missing.push("raid_level");
        }
        if req.base_bdevs.is_empty() {
            missing.push("base_bdevs");
        }
        if !missing.is_empty() {
            return Err(BdevError {
                operation: OPERATION,
                source: ClientError::validation(
                    missing,
                    "name, raid_level, and base_bdevs are required",
                ),
            });
        }

        let params = params! {
            "name" => &req.name,
            "raid_level" => &req.raid_level,
            "base_bdevs" => normalize_base_bdevs(&req.base_bdevs),
            "strip_size_kb" => req.strip_size_kb.filter(|kb| *kb > 0),
            "uuid" => req.uuid.as_deref(),
            "superblock" => req.superblock,
        };
        self.call_rpc(OPERATION, "bdev_raid_create", params).await
    }

    /// Detach an NVMe controller; `trtype` and `traddr` narrow which path is removed
    pub async fn detach_nvme_controller(
        &self,
        name: &str,
        trtype: Option<&str>,
        traddr: Option<&str>,
    ) -> Result<Value, BdevError> {
        let params = params! {
            "name" => name,
            "trtype" => trtype,
            "traddr" => traddr,
        };
        self.call_rpc(
            "detach NVMe controller",
            "bdev_nvme_detach_controller",
            params,
        )
        .await
    }

    pub async fn delete_malloc_bdev(&self, name: &str) -> Result<Value, BdevError> {
        self.call_rpc(
            "delete malloc bdev",
            "bdev_malloc_delete",
            params! { "name" => name },
        )
        .await
    }

    pub async fn delete_raid_bdev(&self, name: &str) -> Result<Value, BdevError> {
        self.call_rpc(
            "delete RAID bdev",
            "bdev_raid_delete",
            params! { "name" => name },
        )
        .await
    }

    /// Add `base_bdev` as a member of the RAID bdev `raid_bdev`
    pub async fn add_raid_base_bdev(
        &self,
        raid_bdev: &str,
        base_bdev: &str,
    ) -> Result<Value, BdevError> {
        let params = params! {
            "raid_bdev" => raid_bdev,
            "base_bdev" => base_bdev,
        };
        self.call_rpc(
            "add base bdev to RAID",
            "bdev_raid_add_base_bdev",
            params,
        )
        .await
    }

    pub async fn remove_raid_base_bdev(&self, name: &str) -> Result<Value, BdevError> {
        self.call_rpc(
            "remove base bdev from RAID",
            "bdev_raid_remove_base_bdev",
            params! { "name" => name },
        )
        .await
    }

    /// Clear the superblock region of `name`. A `size` of 0 lets the daemon pick (1 MiB).
    pub async fn wipe_superblock(&self, name: &str, size: u64) -> Result<Value, BdevError> {
        let params = params! {
            "name" => name,
            "size" => size,
        };
        self.call_rpc("wipe superblock", "bdev_wipe_superblock", params)
            .await
    }
}

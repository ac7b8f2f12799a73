//! Applying an update onto an existing record
//!
//! Fields present in the update replace the existing value; absent fields
//! keep it. Not-editable fields are then copied back from the existing record
//! no matter what the update carried.

use crate::model::{DocArtifact, ModelArtifact};

/// Records that can absorb a partial update
///
/// Not-editable fields are `id`, `createTimeSinceEpoch` and
/// `lastUpdateTimeSinceEpoch`; the store assigns all three.
pub trait Updatable: Clone + Default {
    /// Overlay the present fields of `update` onto `self`
    fn overlay(self, update: Self) -> Self;

    /// Copy every not-editable field from `existing`
    fn restore_not_editable(&mut self, existing: &Self);

    /// Drop caller-supplied values of not-editable fields
    fn clear_not_editable(&mut self) {
        self.restore_not_editable(&Self::default());
    }
}

/// Merge `update` onto `existing`, keeping not-editable fields intact
pub fn apply_update<T: Updatable>(existing: &T, update: T) -> T {
    let mut merged = existing.clone().overlay(update);
    merged.restore_not_editable(existing);
    merged
}

impl Updatable for ModelArtifact {
    fn overlay(self, update: Self) -> Self {
        Self {
            id: update.id.or(self.id),
            name: update.name.or(self.name),
            external_id: update.external_id.or(self.external_id),
            description: update.description.or(self.description),
            uri: update.uri.or(self.uri),
            state: update.state.or(self.state),
            custom_properties: update.custom_properties.or(self.custom_properties),
            create_time_since_epoch: update.create_time_since_epoch.or(self.create_time_since_epoch),
            last_update_time_since_epoch: update
                .last_update_time_since_epoch
                .or(self.last_update_time_since_epoch),
            model_format_name: update.model_format_name.or(self.model_format_name),
            model_format_version: update.model_format_version.or(self.model_format_version),
            storage_key: update.storage_key.or(self.storage_key),
            storage_path: update.storage_path.or(self.storage_path),
            service_account_name: update.service_account_name.or(self.service_account_name),
        }
    }

    fn restore_not_editable(&mut self, existing: &Self) {
        self.id = existing.id.clone();
        self.create_time_since_epoch = existing.create_time_since_epoch.clone();
        self.last_update_time_since_epoch = existing.last_update_time_since_epoch.clone();
    }
}

impl Updatable for DocArtifact {
    fn overlay(self, update: Self) -> Self {
        Self {
            id: update.id.or(self.id),
            name: update.name.or(self.name),
            external_id: update.external_id.or(self.external_id),
            description: update.description.or(self.description),
            uri: update.uri.or(self.uri),
            state: update.state.or(self.state),
            custom_properties: update.custom_properties.or(self.custom_properties),
            create_time_since_epoch: update.create_time_since_epoch.or(self.create_time_since_epoch),
            last_update_time_since_epoch: update
                .last_update_time_since_epoch
                .or(self.last_update_time_since_epoch),
        }
    }

    fn restore_not_editable(&mut self, existing: &Self) {
        self.id = existing.id.clone();
        self.create_time_since_epoch = existing.create_time_since_epoch.clone();
        self.last_update_time_since_epoch = existing.last_update_time_since_epoch.clone();
    }
}

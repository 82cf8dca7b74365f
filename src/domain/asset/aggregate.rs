//! Asset aggregate.
//!
//! An asset is any holding that can be converted into cash. Its state is
//! derived entirely from `asset.*` events; it is never physically removed.

use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::domain::foundation::{
    Aggregate, AggregateError, AggregateId, AggregateRoot, EventHandlers, PayloadType,
};

use super::{AssetCreated, AssetDeleted, AssetError, AssetModified, AssetType, Currency, Money};

/// Handler table shared by every asset instance.
static ASSET_HANDLERS: Lazy<Result<Arc<EventHandlers<Asset>>, AggregateError>> =
    Lazy::new(|| Asset::event_handlers().map(Arc::new));

/// Event-sourced asset.
#[derive(Debug, Clone)]
pub struct Asset {
    root: AggregateRoot<Asset>,
    name: String,
    asset_type: AssetType,
    money: Money,
    deleted: bool,
}

impl Asset {
    /// Creates a new asset and records `asset.created`.
    ///
    /// # Errors
    ///
    /// - `NameRequired` if the name is blank
    /// - `InvalidAmount` if the money is invalid
    pub fn create(
        id: AggregateId,
        name: impl Into<String>,
        asset_type: AssetType,
        money: Money,
    ) -> Result<Self, AssetError> {
        let name = name.into();
        validate_attributes(&name, &money)?;

        let mut asset = Self::blank(id)?;
        asset.apply_new_change(AssetCreated {
            asset_id: id,
            name,
            asset_type,
            amount: money.amount(),
            currency: money.currency(),
        })?;
        Ok(asset)
    }

    /// Changes the asset's attributes.
    ///
    /// Returns `false` and records nothing when every value is unchanged.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the asset is deleted
    /// - `NameRequired` / `InvalidAmount` for invalid values
    pub fn modify(
        &mut self,
        name: impl Into<String>,
        asset_type: AssetType,
        money: Money,
    ) -> Result<bool, AssetError> {
        if self.deleted {
            return Err(AssetError::NotFound(self.id()));
        }

        let name = name.into();
        validate_attributes(&name, &money)?;

        if name == self.name && asset_type == self.asset_type && money == self.money {
            return Ok(false);
        }

        self.apply_new_change(AssetModified {
            asset_id: self.id(),
            name,
            asset_type,
            amount: money.amount(),
            currency: money.currency(),
        })?;
        Ok(true)
    }

    /// Records `asset.deleted`. Deleting an already deleted asset is a no-op.
    pub fn mark_as_deleted(&mut self) -> Result<(), AssetError> {
        if self.deleted {
            return Ok(());
        }
        self.apply_new_change(AssetDeleted {
            asset_id: self.id(),
        })?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn asset_type(&self) -> AssetType {
        self.asset_type
    }

    pub fn money(&self) -> Money {
        self.money
    }

    fn event_handlers() -> Result<EventHandlers<Asset>, AggregateError> {
        EventHandlers::builder()
            .on::<AssetCreated>(Asset::on_created)
            .on::<AssetModified>(Asset::on_modified)
            .on::<AssetDeleted>(Asset::on_deleted)
            .build()
    }

    fn on_created(&mut self, event: &AssetCreated) -> Result<(), AggregateError> {
        self.name = event.name.clone();
        self.asset_type = event.asset_type;
        self.money = money_from_event(event.amount, event.currency)?;
        Ok(())
    }

    fn on_modified(&mut self, event: &AssetModified) -> Result<(), AggregateError> {
        self.name = event.name.clone();
        self.asset_type = event.asset_type;
        self.money = money_from_event(event.amount, event.currency)?;
        Ok(())
    }

    fn on_deleted(&mut self, _event: &AssetDeleted) -> Result<(), AggregateError> {
        self.deleted = true;
        Ok(())
    }
}

impl Aggregate for Asset {
    const AGGREGATE_TYPE: &'static str = "asset";
    const EVENT_TYPES: &'static [&'static str] = &[
        AssetCreated::EVENT_TYPE,
        AssetModified::EVENT_TYPE,
        AssetDeleted::EVENT_TYPE,
    ];

    fn root(&self) -> &AggregateRoot<Self> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<Self> {
        &mut self.root
    }

    fn blank(id: AggregateId) -> Result<Self, AggregateError> {
        let handlers = ASSET_HANDLERS.as_ref().map_err(Clone::clone)?;
        Ok(Self {
            root: AggregateRoot::new(id, Arc::clone(handlers)),
            name: String::new(),
            asset_type: AssetType::Other,
            money: Money::zero(Currency::Usd),
            deleted: false,
        })
    }

    fn check_invariants(&self) -> Result<(), AggregateError> {
        validate_attributes(&self.name, &self.money)
            .map_err(|e| AggregateError::InvariantViolation(e.to_string()))
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

fn validate_attributes(name: &str, money: &Money) -> Result<(), AssetError> {
    if name.trim().is_empty() {
        return Err(AssetError::NameRequired);
    }
    money.validate()
}

fn money_from_event(amount: f64, currency: Currency) -> Result<Money, AggregateError> {
    Money::new(amount, currency).map_err(|e| AggregateError::InvariantViolation(e.to_string()))
}

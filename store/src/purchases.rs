use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use memomatch_core::{CategoryId, Entitlements};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::*;

pub const PURCHASES_KEY: &str = "memory-game-purchases-v1";

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductId {
    PackLetters,
    PackNumbers,
    PackHospital,
    PackUtilityCars,
    RemoveAds,
    BundleAllAccess,
}

impl ProductId {
    pub const ALL: [ProductId; 6] = [
        ProductId::PackLetters,
        ProductId::PackNumbers,
        ProductId::PackHospital,
        ProductId::PackUtilityCars,
        ProductId::RemoveAds,
        ProductId::BundleAllAccess,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductId::PackLetters => "pack_letters",
            ProductId::PackNumbers => "pack_numbers",
            ProductId::PackHospital => "pack_hospital",
            ProductId::PackUtilityCars => "pack_utility_cars",
            ProductId::RemoveAds => "remove_ads",
            ProductId::BundleAllAccess => "bundle_all_access",
        }
    }

    /// Store price shown before the platform reports its own.
    pub fn price_label(self) -> &'static str {
        match self {
            ProductId::PackLetters | ProductId::PackNumbers => "EUR 2.99",
            ProductId::PackHospital | ProductId::PackUtilityCars => "EUR 3.99",
            ProductId::RemoveAds => "EUR 1.99",
            ProductId::BundleAllAccess => "EUR 7.99",
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol category as offered on the pack screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CategoryPack {
    pub category: CategoryId,
    pub product: Option<ProductId>,
    pub is_free: bool,
}

impl CategoryPack {
    pub const fn free(category: CategoryId) -> Self {
        Self {
            category,
            product: None,
            is_free: true,
        }
    }

    pub const fn premium(category: CategoryId, product: ProductId) -> Self {
        Self {
            category,
            product: Some(product),
            is_free: false,
        }
    }

    pub fn price_label(&self) -> &'static str {
        match self.product {
            Some(product) if !self.is_free => product.price_label(),
            _ => "Free",
        }
    }
}

/// Every category currently ships free.
pub const PACKS: [CategoryPack; 5] = [
    CategoryPack::free(CategoryId::Animals),
    CategoryPack::free(CategoryId::Letters),
    CategoryPack::free(CategoryId::Numbers),
    CategoryPack::free(CategoryId::Hospital),
    CategoryPack::free(CategoryId::UtilityCars),
];

pub fn pack_for(category: CategoryId) -> Option<&'static CategoryPack> {
    PACKS.iter().find(|pack| pack.category == category)
}

/// Stored document: `{"ownedProducts": [...]}`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseDocument {
    owned_products: Vec<ProductId>,
}

/// Products the player owns, persisted under [`PURCHASES_KEY`].
pub struct PurchaseLedger {
    store: Rc<dyn KeyValueStore>,
    catalog: &'static [CategoryPack],
    owned: BTreeSet<ProductId>,
}

impl PurchaseLedger {
    /// Loads owned products. Unknown ids and unreadable storage are ignored.
    pub fn load(store: Rc<dyn KeyValueStore>) -> Self {
        let owned = match read_json(store.as_ref(), PURCHASES_KEY) {
            Ok(Some(mut value)) => match value.get_mut("ownedProducts").map(Value::take) {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
                _ => {
                    log::warn!("Stored purchases have no list of owned products");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                log::warn!("Could not read purchases: {err}");
                BTreeSet::new()
            }
        };
        Self {
            store,
            catalog: &PACKS,
            owned,
        }
    }

    /// Gates categories by `catalog` instead of the shipped [`PACKS`].
    pub fn with_catalog(mut self, catalog: &'static [CategoryPack]) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &'static [CategoryPack] {
        self.catalog
    }

    pub fn owned(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.owned.iter().copied()
    }

    pub fn is_owned(&self, product: ProductId) -> bool {
        self.owned.contains(&ProductId::BundleAllAccess) || self.owned.contains(&product)
    }

    /// Records a completed purchase. The bundle grants every product.
    pub fn purchase(&mut self, product: ProductId) {
        self.grant(product);
        self.persist();
    }

    /// Replaces the owned set with what the platform store reports.
    pub fn restore(&mut self, products: impl IntoIterator<Item = ProductId>) {
        self.owned.clear();
        for product in products {
            self.grant(product);
        }
        self.persist();
    }

    pub fn should_show_ads(&self) -> bool {
        !self.is_owned(ProductId::RemoveAds)
    }

    pub fn price_label(&self, product: ProductId) -> &'static str {
        product.price_label()
    }

    fn grant(&mut self, product: ProductId) {
        if product == ProductId::BundleAllAccess {
            self.owned.extend(ProductId::ALL);
        } else {
            self.owned.insert(product);
        }
    }

    fn persist(&self) {
        let document = PurchaseDocument {
            owned_products: self.owned.iter().copied().collect(),
        };
        if let Err(err) = write_json(self.store.as_ref(), PURCHASES_KEY, &document) {
            log::error!("Could not save purchases: {err}");
        }
    }
}

impl Entitlements for PurchaseLedger {
    fn is_category_unlocked(&self, category: CategoryId) -> bool {
        let pack = self.catalog.iter().find(|pack| pack.category == category);
        match pack {
            Some(&CategoryPack {
                product: Some(product),
                is_free: false,
                ..
            }) => self.is_owned(product),
            _ => true,
        }
    }

    fn fallback_category(&self) -> CategoryId {
        self.catalog
            .iter()
            .find(|pack| pack.is_free)
            .map_or(CategoryId::Animals, |pack| pack.category)
    }
}

#[cfg(test)]
mod tests {
    use memomatch_core::{GroupSize, SessionConfig};

    use super::*;

    const PAID_VEHICLES: [CategoryPack; 3] = [
        CategoryPack::free(CategoryId::Letters),
        CategoryPack::premium(CategoryId::Hospital, ProductId::PackHospital),
        CategoryPack::premium(CategoryId::UtilityCars, ProductId::PackUtilityCars),
    ];

    fn ledger() -> (Rc<MemoryStore>, PurchaseLedger) {
        let kv = Rc::new(MemoryStore::new());
        let ledger = PurchaseLedger::load(kv.clone());
        (kv, ledger)
    }

    #[test]
    fn every_category_ships_free() {
        let (_, ledger) = ledger();
        for category in CategoryId::ALL {
            let pack = pack_for(category).unwrap();
            assert!(pack.is_free);
            assert_eq!(pack.price_label(), "Free");
            assert!(ledger.is_category_unlocked(category));
        }
        assert_eq!(ledger.fallback_category(), CategoryId::Animals);
        assert!(ledger.should_show_ads());
    }

    #[test]
    fn loads_stored_document() {
        let kv = Rc::new(MemoryStore::new());
        kv.set(PURCHASES_KEY, r#"{"ownedProducts":["remove_ads","pack_hospital"]}"#)
            .unwrap();
        let ledger = PurchaseLedger::load(kv);

        assert!(!ledger.should_show_ads());
        assert!(ledger.is_owned(ProductId::PackHospital));
        assert!(!ledger.is_owned(ProductId::PackLetters));
    }

    #[test]
    fn purchase_persists_as_document() {
        let (kv, mut ledger) = ledger();
        ledger.purchase(ProductId::RemoveAds);
        assert!(!ledger.should_show_ads());

        assert_eq!(
            kv.get(PURCHASES_KEY).unwrap().as_deref(),
            Some(r#"{"ownedProducts":["remove_ads"]}"#)
        );
        let reloaded = PurchaseLedger::load(kv);
        assert!(reloaded.is_owned(ProductId::RemoveAds));
    }

    #[test]
    fn premium_catalog_gates_until_purchase() {
        let (_, ledger) = ledger();
        let mut ledger = ledger.with_catalog(&PAID_VEHICLES);
        assert!(ledger.is_category_unlocked(CategoryId::Letters));
        assert!(ledger.is_category_unlocked(CategoryId::Animals));
        assert!(!ledger.is_category_unlocked(CategoryId::Hospital));
        assert!(!ledger.is_category_unlocked(CategoryId::UtilityCars));
        assert_eq!(ledger.fallback_category(), CategoryId::Letters);
        assert_eq!(PAID_VEHICLES[1].price_label(), "EUR 3.99");

        ledger.purchase(ProductId::PackHospital);
        assert!(ledger.is_category_unlocked(CategoryId::Hospital));
        assert!(!ledger.is_category_unlocked(CategoryId::UtilityCars));
    }

    #[test]
    fn bundle_unlocks_everything() {
        let (kv, ledger) = ledger();
        let mut ledger = ledger.with_catalog(&PAID_VEHICLES);
        ledger.purchase(ProductId::BundleAllAccess);

        for category in CategoryId::ALL {
            assert!(ledger.is_category_unlocked(category));
        }
        assert!(!ledger.should_show_ads());
        assert_eq!(PurchaseLedger::load(kv).owned().count(), ProductId::ALL.len());
    }

    #[test]
    fn owning_bundle_id_alone_owns_everything() {
        let kv = Rc::new(MemoryStore::new());
        kv.set(PURCHASES_KEY, r#"{"ownedProducts":["bundle_all_access"]}"#)
            .unwrap();
        let ledger = PurchaseLedger::load(kv);
        assert!(ledger.is_owned(ProductId::PackUtilityCars));
        assert!(ledger.is_owned(ProductId::RemoveAds));
    }

    #[test]
    fn restore_replaces_owned_products() {
        let (_, mut ledger) = ledger();
        ledger.purchase(ProductId::PackHospital);
        ledger.restore([ProductId::RemoveAds, ProductId::PackUtilityCars]);

        assert!(!ledger.is_owned(ProductId::PackHospital));
        assert!(ledger.is_owned(ProductId::PackUtilityCars));
        assert!(!ledger.should_show_ads());
    }

    #[test]
    fn unknown_products_and_shapes_are_ignored() {
        let kv = Rc::new(MemoryStore::new());
        kv.set(
            PURCHASES_KEY,
            r#"{"ownedProducts":["pack_dinosaurs","remove_ads",7]}"#,
        )
        .unwrap();
        let ledger = PurchaseLedger::load(kv.clone());
        assert_eq!(ledger.owned().collect::<Vec<_>>(), vec![ProductId::RemoveAds]);

        kv.set(PURCHASES_KEY, r#"["remove_ads"]"#).unwrap();
        assert_eq!(PurchaseLedger::load(kv.clone()).owned().count(), 0);

        kv.set(PURCHASES_KEY, "{oops").unwrap();
        assert_eq!(PurchaseLedger::load(kv).owned().count(), 0);
    }

    #[test]
    fn price_labels() {
        let (_, ledger) = ledger();
        assert_eq!(ledger.price_label(ProductId::PackLetters), "EUR 2.99");
        assert_eq!(ledger.price_label(ProductId::PackHospital), "EUR 3.99");
        assert_eq!(ledger.price_label(ProductId::BundleAllAccess), "EUR 7.99");
        assert_eq!(ProductId::RemoveAds.to_string(), "remove_ads");
    }

    #[test]
    fn session_keeps_categories_of_shipped_catalog() {
        let (_, ledger) = ledger();
        let config = SessionConfig::new(GroupSize::Two, "12", vec![CategoryId::Hospital]);
        assert_eq!(config.resolve_categories(&ledger), vec![CategoryId::Hospital]);

        let ledger = ledger.with_catalog(&PAID_VEHICLES);
        assert_eq!(config.resolve_categories(&ledger), vec![CategoryId::Letters]);
    }
}

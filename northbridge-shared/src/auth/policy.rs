/// Capability rules
///
/// An [`Ability`] is an ordered list of `can` / `cannot` rules built for one
/// principal. Routes declare [`PolicyCheck`]s that are evaluated at the type
/// level before the handler runs; handlers that touch an owned record run an
/// instance-level check against a [`Resource`] built from the loaded row.
///
/// # Evaluation
///
/// Rules are scanned from the most recently added to the first. The first
/// rule whose action and subject match decides: `can` allows, `cannot`
/// denies. When nothing matches the request is denied.
///
/// - Type level ([`Ability::can`]): a conditional `can` counts as a match
///   (some instance may be allowed), a conditional `cannot` is skipped.
/// - Instance level ([`Ability::can_on`]): a conditional rule matches only
///   when the resource field equals the principal id.
///
/// # Rules per role
///
/// | Role   | Rules (in order) |
/// |--------|------------------|
/// | USER   | can manage User (own id); can read User, Product, Vendor, Store, StoreCategory, ProductCategory; can manage Cart, Order (own user_id); can manage OrderItem (own order.user_id); cannot create/update/delete Product, Vendor |
/// | VENDOR | can manage Vendor (own id); can read User, Vendor, Store, StoreCategory, ProductCategory; can create Store, Product, StoreCategory, ProductCategory; can manage Store (own vendor_id); can manage StoreCategory, ProductCategory; can manage Product (own store.vendor_id); cannot manage Admin, User |
/// | ADMIN  | can manage all; can update/delete Admin (own id) |
///
/// # Example
///
/// ```
/// use northbridge_shared::auth::policy::{Ability, Action, Field, Resource, Subject};
/// use northbridge_shared::models::role::Role;
/// use uuid::Uuid;
///
/// let vendor_id = Uuid::new_v4();
/// let ability = Ability::for_principal(vendor_id, Role::Vendor);
///
/// assert!(ability.can(Action::Create, Subject::Store));
/// assert!(ability.cannot(Action::Read, Subject::Admin));
///
/// let own_store = Resource::new(Subject::Store).with(Field::VendorId, Some(vendor_id));
/// assert!(ability.can_on(Action::Update, &own_store));
/// ```

use serde::Serialize;
use uuid::Uuid;

use crate::models::role::Role;

/// What a principal wants to do. `Manage` stands for every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Manage,
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Manage => "manage",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }

    /// Whether a rule written for `self` covers a request for `requested`
    fn covers(&self, requested: Action) -> bool {
        *self == Action::Manage || *self == requested
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource types rules are written against. `All` stands for every subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Subject {
    All,
    Admin,
    User,
    Vendor,
    Product,
    Store,
    StoreCategory,
    ProductCategory,
    Cart,
    Order,
    OrderItem,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::All => "all",
            Subject::Admin => "Admin",
            Subject::User => "User",
            Subject::Vendor => "Vendor",
            Subject::Product => "Product",
            Subject::Store => "Store",
            Subject::StoreCategory => "StoreCategory",
            Subject::ProductCategory => "ProductCategory",
            Subject::Cart => "Cart",
            Subject::Order => "Order",
            Subject::OrderItem => "OrderItem",
        }
    }

    fn covers(&self, requested: Subject) -> bool {
        *self == Subject::All || *self == requested
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ownership fields a condition can compare against the principal id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The record's own id (accounts)
    Id,
    /// `user_id` (carts, orders)
    UserId,
    /// `vendor_id` (stores)
    VendorId,
    /// `store.vendor_id` (products)
    StoreVendorId,
    /// `order.user_id` (order items)
    OrderUserId,
}

/// `field == equals`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub field: Field,
    pub equals: Uuid,
}

impl Condition {
    fn holds_for(&self, resource: &Resource) -> bool {
        resource.get(self.field) == Some(self.equals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub actions: &'static [Action],
    pub subjects: &'static [Subject],
    pub condition: Option<Condition>,
    /// `true` for `cannot` rules
    pub inverted: bool,
}

impl Rule {
    fn applies_to(&self, action: Action, subject: Subject) -> bool {
        self.actions.iter().any(|a| a.covers(action))
            && self.subjects.iter().any(|s| s.covers(subject))
    }
}

/// A concrete record presented to an instance-level check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub subject: Subject,
    fields: Vec<(Field, Uuid)>,
}

impl Resource {
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            fields: Vec::new(),
        }
    }

    /// Attaches an ownership field. `None` leaves the field unset, which
    /// never satisfies a condition.
    pub fn with(mut self, field: Field, value: Option<Uuid>) -> Self {
        if let Some(value) = value {
            self.fields.retain(|(f, _)| *f != field);
            self.fields.push((field, value));
        }
        self
    }

    pub fn get(&self, field: Field) -> Option<Uuid> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
    }
}

/// Implemented by models that can be checked at instance level
pub trait AsResource {
    fn as_resource(&self) -> Resource;
}

/// An (action, subject) pair declared by a route guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolicyCheck {
    pub action: Action,
    pub subject: Subject,
}

impl PolicyCheck {
    pub const fn new(action: Action, subject: Subject) -> Self {
        Self { action, subject }
    }

    pub const READ_ADMIN: Self = Self::new(Action::Read, Subject::Admin);
    pub const UPDATE_ADMIN: Self = Self::new(Action::Update, Subject::Admin);
    pub const DELETE_ADMIN: Self = Self::new(Action::Delete, Subject::Admin);

    pub const READ_USER: Self = Self::new(Action::Read, Subject::User);
    pub const UPDATE_USER: Self = Self::new(Action::Update, Subject::User);
    pub const DELETE_USER: Self = Self::new(Action::Delete, Subject::User);

    pub const READ_VENDOR: Self = Self::new(Action::Read, Subject::Vendor);
    pub const UPDATE_VENDOR: Self = Self::new(Action::Update, Subject::Vendor);
    pub const DELETE_VENDOR: Self = Self::new(Action::Delete, Subject::Vendor);

    pub const CREATE_PRODUCT: Self = Self::new(Action::Create, Subject::Product);
    pub const READ_PRODUCT: Self = Self::new(Action::Read, Subject::Product);
    pub const UPDATE_PRODUCT: Self = Self::new(Action::Update, Subject::Product);
    pub const DELETE_PRODUCT: Self = Self::new(Action::Delete, Subject::Product);

    pub const CREATE_STORE: Self = Self::new(Action::Create, Subject::Store);
    pub const READ_STORE: Self = Self::new(Action::Read, Subject::Store);
    pub const UPDATE_STORE: Self = Self::new(Action::Update, Subject::Store);
    pub const DELETE_STORE: Self = Self::new(Action::Delete, Subject::Store);

    pub const CREATE_STORE_CATEGORY: Self = Self::new(Action::Create, Subject::StoreCategory);
    pub const READ_STORE_CATEGORY: Self = Self::new(Action::Read, Subject::StoreCategory);
    pub const UPDATE_STORE_CATEGORY: Self = Self::new(Action::Update, Subject::StoreCategory);
    pub const DELETE_STORE_CATEGORY: Self = Self::new(Action::Delete, Subject::StoreCategory);

    pub const CREATE_PRODUCT_CATEGORY: Self = Self::new(Action::Create, Subject::ProductCategory);
    pub const UPDATE_PRODUCT_CATEGORY: Self = Self::new(Action::Update, Subject::ProductCategory);
    pub const DELETE_PRODUCT_CATEGORY: Self = Self::new(Action::Delete, Subject::ProductCategory);

    pub const CREATE_CART: Self = Self::new(Action::Create, Subject::Cart);
    pub const UPDATE_CART: Self = Self::new(Action::Update, Subject::Cart);
    pub const DELETE_CART: Self = Self::new(Action::Delete, Subject::Cart);

    pub const CREATE_ORDER: Self = Self::new(Action::Create, Subject::Order);
    pub const READ_ORDER: Self = Self::new(Action::Read, Subject::Order);
    pub const UPDATE_ORDER: Self = Self::new(Action::Update, Subject::Order);
    pub const DELETE_ORDER: Self = Self::new(Action::Delete, Subject::Order);

    pub const CREATE_ORDER_ITEM: Self = Self::new(Action::Create, Subject::OrderItem);
}

impl std::fmt::Display for PolicyCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.action, self.subject)
    }
}

/// Collects rules for one principal, mirroring `can` / `cannot` declarations
struct AbilityBuilder {
    principal_id: Uuid,
    rules: Vec<Rule>,
}

impl AbilityBuilder {
    fn new(principal_id: Uuid) -> Self {
        Self {
            principal_id,
            rules: Vec::new(),
        }
    }

    fn push(
        &mut self,
        actions: &'static [Action],
        subjects: &'static [Subject],
        owned_by: Option<Field>,
        inverted: bool,
    ) -> &mut Self {
        let condition = owned_by.map(|field| Condition {
            field,
            equals: self.principal_id,
        });
        self.rules.push(Rule {
            actions,
            subjects,
            condition,
            inverted,
        });
        self
    }

    fn can(&mut self, actions: &'static [Action], subjects: &'static [Subject]) -> &mut Self {
        self.push(actions, subjects, None, false)
    }

    fn can_own(
        &mut self,
        actions: &'static [Action],
        subjects: &'static [Subject],
        field: Field,
    ) -> &mut Self {
        self.push(actions, subjects, Some(field), false)
    }

    fn cannot(&mut self, actions: &'static [Action], subjects: &'static [Subject]) -> &mut Self {
        self.push(actions, subjects, None, true)
    }

    fn build(self) -> Ability {
        Ability { rules: self.rules }
    }
}

/// Rule set of a single principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ability {
    rules: Vec<Rule>,
}

impl Ability {
    /// Builds the rule set for an authenticated principal
    pub fn for_principal(principal_id: Uuid, role: Role) -> Self {
        use Action::*;

        let mut builder = AbilityBuilder::new(principal_id);

        match role {
            Role::User => {
                builder
                    .can_own(&[Manage], &[Subject::User], Field::Id)
                    .can(
                        &[Read],
                        &[
                            Subject::User,
                            Subject::Product,
                            Subject::Vendor,
                            Subject::Store,
                            Subject::StoreCategory,
                            Subject::ProductCategory,
                        ],
                    )
                    .can_own(&[Manage], &[Subject::Cart, Subject::Order], Field::UserId)
                    .can_own(&[Manage], &[Subject::OrderItem], Field::OrderUserId)
                    .cannot(
                        &[Create, Update, Delete],
                        &[Subject::Product, Subject::Vendor],
                    );
            }
            Role::Vendor => {
                builder
                    .can_own(&[Manage], &[Subject::Vendor], Field::Id)
                    .can(
                        &[Read],
                        &[
                            Subject::User,
                            Subject::Vendor,
                            Subject::Store,
                            Subject::StoreCategory,
                            Subject::ProductCategory,
                        ],
                    )
                    .can(
                        &[Create],
                        &[
                            Subject::Store,
                            Subject::Product,
                            Subject::StoreCategory,
                            Subject::ProductCategory,
                        ],
                    )
                    .can_own(&[Manage], &[Subject::Store], Field::VendorId)
                    .can(
                        &[Manage],
                        &[Subject::StoreCategory, Subject::ProductCategory],
                    )
                    .can_own(&[Manage], &[Subject::Product], Field::StoreVendorId)
                    .cannot(&[Manage], &[Subject::Admin, Subject::User]);
            }
            Role::Admin => {
                builder
                    .can(&[Manage], &[Subject::All])
                    .can_own(&[Update, Delete], &[Subject::Admin], Field::Id);
            }
        }

        builder.build()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Type-level check: could the principal perform `action` on some `subject`?
    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.rules
            .iter()
            .rev()
            .filter(|rule| rule.applies_to(action, subject))
            .find(|rule| !(rule.inverted && rule.condition.is_some()))
            .map(|rule| !rule.inverted)
            .unwrap_or(false)
    }

    pub fn cannot(&self, action: Action, subject: Subject) -> bool {
        !self.can(action, subject)
    }

    pub fn allows(&self, check: PolicyCheck) -> bool {
        self.can(check.action, check.subject)
    }

    /// Instance-level check against a concrete record
    pub fn can_on(&self, action: Action, resource: &Resource) -> bool {
        self.rules
            .iter()
            .rev()
            .filter(|rule| rule.applies_to(action, resource.subject))
            .find(|rule| {
                rule.condition
                    .map_or(true, |condition| condition.holds_for(resource))
            })
            .map(|rule| !rule.inverted)
            .unwrap_or(false)
    }
}

use std::{fmt::Display, str::FromStr, time::Duration};

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::LifecycleAction;
use crate::{
    db_types::{Order, OrderId, RestaurantId, UserId},
    engine_api::errors::LifecycleError,
    gateways::{bounded, GatewayError, IdentityProvider},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Restaurant,
    Dasher,
    /// Campus dispatch staff. May assign dashers and read any order.
    Dispatch,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Customer => "customer",
            Role::Restaurant => "restaurant",
            Role::Dasher => "dasher",
            Role::Dispatch => "dispatch",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "restaurant" => Ok(Role::Restaurant),
            "dasher" => Ok(Role::Dasher),
            "dispatch" => Ok(Role::Dispatch),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}

/// Whoever is asking the engine to do something. For restaurant actors, `id` is the restaurant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new<S: Into<UserId>>(id: S, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn customer<S: Into<UserId>>(id: S) -> Self {
        Self::new(id, Role::Customer)
    }

    pub fn dasher<S: Into<UserId>>(id: S) -> Self {
        Self::new(id, Role::Dasher)
    }

    pub fn restaurant(id: &RestaurantId) -> Self {
        Self::new(id.as_str(), Role::Restaurant)
    }

    pub fn dispatch<S: Into<UserId>>(id: S) -> Self {
        Self::new(id, Role::Dispatch)
    }

    fn owns_restaurant(&self, order: &Order) -> bool {
        self.role == Role::Restaurant && self.id.as_str() == order.restaurant_id.as_str()
    }

    fn is_customer_of(&self, order: &Order) -> bool {
        self.role == Role::Customer && self.id == order.customer_id
    }

    fn is_dasher_of(&self, order: &Order) -> bool {
        self.role == Role::Dasher && order.is_assigned_to(&self.id)
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.role, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{actor} may not {action} order {order_id}")]
pub struct AccessDenied {
    pub actor: Actor,
    pub action: LifecycleAction,
    pub order_id: OrderId,
}

/// Decides whether `actor` may attempt `action` on `order`.
///
/// This only looks at who is asking. Whether the order's current status permits the action is a separate check.
pub fn authorize(action: LifecycleAction, actor: &Actor, order: &Order) -> Result<(), AccessDenied> {
    use LifecycleAction::*;
    let permitted = match action {
        View => {
            actor.role == Role::Dispatch ||
                actor.is_customer_of(order) ||
                actor.owns_restaurant(order) ||
                actor.is_dasher_of(order) ||
                (actor.role == Role::Dasher && order.is_claimable())
        },
        // Only payment reconciliation confirms orders
        ConfirmPayment => false,
        StartPreparing | MarkReady => actor.owns_restaurant(order),
        AssignDasher => actor.role == Role::Dispatch || actor.owns_restaurant(order),
        Accept => actor.role == Role::Dasher,
        PickUp | Complete => actor.is_dasher_of(order),
        Cancel => actor.is_customer_of(order) || actor.owns_restaurant(order),
    };
    if permitted {
        Ok(())
    } else {
        Err(AccessDenied { actor: actor.clone(), action, order_id: order.order_id.clone() })
    }
}

/// Resolves a bearer credential into an [`Actor`] via the identity provider.
///
/// Rejected credentials are `Forbidden`. A provider that is down or too slow is `UpstreamUnavailable`.
pub async fn resolve_actor<P: IdentityProvider>(
    provider: &P,
    bearer: &str,
    timeout: Duration,
) -> Result<Actor, LifecycleError> {
    match bounded(timeout, provider.verify(bearer)).await {
        Ok(identity) => {
            trace!("🔐️ Resolved {} {}", identity.role, identity.user_id);
            Ok(Actor { id: identity.user_id, role: identity.role })
        },
        Err(GatewayError::Rejected(reason)) => {
            debug!("🔐️ Credential rejected by the identity provider: {reason}");
            Err(LifecycleError::Forbidden(format!("Credential rejected: {reason}")))
        },
        Err(e) => {
            warn!("🔐️ Identity provider call failed: {e}");
            Err(LifecycleError::UpstreamUnavailable(e.to_string()))
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use dash_common::Cents;

    use super::*;
    use crate::{
        db_types::{OrderStatusType, OrderStatusType::*},
        gateways::Identity,
    };

    fn order(status: OrderStatusType, dasher: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: 1,
            order_id: OrderId::from("o-1"),
            customer_id: UserId::from("alice"),
            restaurant_id: RestaurantId::from("bagel-barn"),
            dasher_id: dasher.map(UserId::from),
            line_items: vec![],
            subtotal: Cents::ZERO,
            delivery_fee: Cents::ZERO,
            dasher_fee: Cents::ZERO,
            total: Cents::ZERO,
            status,
            delivery_address: "Dorm 4".into(),
            delivery_instructions: None,
            payment_intent_id: Some("pi_1".into()),
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            ready_at: None,
            picked_up_at: None,
            delivered_at: None,
        }
    }

    fn alice() -> Actor {
        Actor::customer("alice")
    }

    fn bob() -> Actor {
        Actor::customer("bob")
    }

    fn barn() -> Actor {
        Actor::restaurant(&RestaurantId::from("bagel-barn"))
    }

    fn other_restaurant() -> Actor {
        Actor::restaurant(&RestaurantId::from("taco-hut"))
    }

    #[test]
    fn restaurant_actions() {
        let o = order(Confirmed, None);
        assert!(authorize(LifecycleAction::StartPreparing, &barn(), &o).is_ok());
        assert!(authorize(LifecycleAction::MarkReady, &barn(), &o).is_ok());
        assert!(authorize(LifecycleAction::StartPreparing, &other_restaurant(), &o).is_err());
        assert!(authorize(LifecycleAction::StartPreparing, &alice(), &o).is_err());
        assert!(authorize(LifecycleAction::MarkReady, &Actor::dispatch("ops"), &o).is_err());
        // A customer whose id happens to match the restaurant id is still a customer
        assert!(authorize(LifecycleAction::StartPreparing, &Actor::customer("bagel-barn"), &o).is_err());
    }

    #[test]
    fn dasher_actions() {
        let o = order(PickedUp, Some("dave"));
        assert!(authorize(LifecycleAction::Complete, &Actor::dasher("dave"), &o).is_ok());
        assert!(authorize(LifecycleAction::PickUp, &Actor::dasher("dave"), &o).is_ok());
        let denied = authorize(LifecycleAction::Complete, &Actor::dasher("erin"), &o).unwrap_err();
        assert_eq!(denied.action, LifecycleAction::Complete);
        assert_eq!(denied.to_string(), "dasher erin may not complete order o-1");
        assert!(authorize(LifecycleAction::Complete, &Actor::customer("dave"), &o).is_err());
        assert!(authorize(LifecycleAction::Accept, &Actor::dasher("erin"), &o).is_ok());
        assert!(authorize(LifecycleAction::Accept, &barn(), &o).is_err());
        assert!(authorize(LifecycleAction::Accept, &alice(), &o).is_err());
    }

    #[test]
    fn assignment_and_cancellation() {
        let o = order(Preparing, None);
        assert!(authorize(LifecycleAction::AssignDasher, &barn(), &o).is_ok());
        assert!(authorize(LifecycleAction::AssignDasher, &Actor::dispatch("ops"), &o).is_ok());
        assert!(authorize(LifecycleAction::AssignDasher, &Actor::dasher("dave"), &o).is_err());
        assert!(authorize(LifecycleAction::Cancel, &alice(), &o).is_ok());
        assert!(authorize(LifecycleAction::Cancel, &barn(), &o).is_ok());
        assert!(authorize(LifecycleAction::Cancel, &bob(), &o).is_err());
        assert!(authorize(LifecycleAction::Cancel, &Actor::dasher("dave"), &o).is_err());
    }

    #[test]
    fn nobody_confirms_payments() {
        let o = order(Pending, None);
        for actor in [alice(), barn(), Actor::dasher("dave"), Actor::dispatch("ops")] {
            assert!(authorize(LifecycleAction::ConfirmPayment, &actor, &o).is_err());
        }
    }

    #[test]
    fn viewing() {
        let claimable = order(Confirmed, None);
        let assigned = order(Ready, Some("dave"));
        assert!(authorize(LifecycleAction::View, &alice(), &claimable).is_ok());
        assert!(authorize(LifecycleAction::View, &bob(), &claimable).is_err());
        assert!(authorize(LifecycleAction::View, &barn(), &assigned).is_ok());
        assert!(authorize(LifecycleAction::View, &other_restaurant(), &assigned).is_err());
        assert!(authorize(LifecycleAction::View, &Actor::dasher("erin"), &claimable).is_ok());
        assert!(authorize(LifecycleAction::View, &Actor::dasher("erin"), &assigned).is_err());
        assert!(authorize(LifecycleAction::View, &Actor::dasher("dave"), &assigned).is_ok());
        assert!(authorize(LifecycleAction::View, &Actor::dispatch("ops"), &assigned).is_ok());
        assert!(authorize(LifecycleAction::View, &Actor::dasher("erin"), &order(Pending, None)).is_err());
    }

    struct Provider(Result<Identity, GatewayError>);

    impl IdentityProvider for Provider {
        async fn verify(&self, _bearer: &str) -> Result<Identity, GatewayError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn resolving_actors() {
        let timeout = Duration::from_millis(100);
        let ok = Provider(Ok(Identity { user_id: UserId::from("dave"), role: Role::Dasher }));
        assert_eq!(resolve_actor(&ok, "token", timeout).await.unwrap(), Actor::dasher("dave"));
        let rejected = Provider(Err(GatewayError::Rejected("expired".into())));
        let err = resolve_actor(&rejected, "token", timeout).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Forbidden(_)));
        let down = Provider(Err(GatewayError::Unavailable("503".into())));
        let err = resolve_actor(&down, "token", timeout).await.unwrap_err();
        assert!(matches!(err, LifecycleError::UpstreamUnavailable(_)));
    }
}

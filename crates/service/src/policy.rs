//! Who may do what. Handlers compose these checks; none of them touch the
//! database.

use uuid::Uuid;

use models::{car, user};

use crate::errors::ServiceError;

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: Uuid,
    pub is_staff: bool,
}

impl From<&user::Model> for Requester {
    fn from(u: &user::Model) -> Self { Self { id: u.id, is_staff: u.is_staff } }
}

/// Anonymous callers are turned away before anything else happens.
pub fn require_auth(requester: Option<Requester>) -> Result<Requester, ServiceError> {
    requester.ok_or(ServiceError::Unauthenticated)
}

/// Only the car's client may change or delete it.
pub fn can_modify_car(requester: &Requester, car: &car::Model) -> Result<(), ServiceError> {
    if car.is_owned_by(requester.id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("modify this car"))
    }
}

/// An order belongs to whoever owns its car.
pub fn can_modify_order(requester: &Requester, order_car: &car::Model) -> Result<(), ServiceError> {
    if order_car.is_owned_by(requester.id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("modify this order"))
    }
}

pub fn require_staff(requester: &Requester) -> Result<(), ServiceError> {
    if requester.is_staff {
        Ok(())
    } else {
        Err(ServiceError::forbidden("use staff tools"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car_of(client: Option<Uuid>) -> car::Model {
        car::Model {
            id: Uuid::new_v4(),
            plate_nr: "KLM001".into(),
            vin: "VIN".into(),
            notes: None,
            cover: None,
            car_model_id: None,
            client_id: client,
        }
    }

    #[test]
    fn owner_may_modify() {
        let me = Requester { id: Uuid::new_v4(), is_staff: false };
        assert!(can_modify_car(&me, &car_of(Some(me.id))).is_ok());
        assert!(can_modify_order(&me, &car_of(Some(me.id))).is_ok());
    }

    #[test]
    fn other_user_is_forbidden_not_missing() {
        let me = Requester { id: Uuid::new_v4(), is_staff: false };
        let theirs = car_of(Some(Uuid::new_v4()));
        assert!(matches!(can_modify_car(&me, &theirs), Err(ServiceError::Forbidden(_))));
        assert!(matches!(can_modify_order(&me, &theirs), Err(ServiceError::Forbidden(_))));
        assert!(matches!(can_modify_car(&me, &car_of(None)), Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn staff_flag_does_not_grant_ownership() {
        let staff = Requester { id: Uuid::new_v4(), is_staff: true };
        assert!(require_staff(&staff).is_ok());
        assert!(can_modify_car(&staff, &car_of(Some(Uuid::new_v4()))).is_err());
    }

    #[test]
    fn anonymous_is_unauthenticated() {
        assert!(matches!(require_auth(None), Err(ServiceError::Unauthenticated)));
        let me = Requester { id: Uuid::new_v4(), is_staff: false };
        assert_eq!(require_auth(Some(me)).unwrap(), me);
    }
}

//! Coupon validation and administration.

use std::sync::Arc;

use common::{Clock, CouponId};
use domain::{Coupon, CouponCode, CouponEvaluation, CouponOutcome, Money, evaluate};
use store::CouponStore;

use crate::commands::CreateCoupon;
use crate::error::{CheckoutError, Result};

/// Looks coupons up by code and runs the evaluator against them.
#[derive(Clone)]
pub struct CouponDesk<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: CouponStore> CouponDesk<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Dry-run evaluation for the public validation endpoint.
    ///
    /// An empty code is a validation error; an unknown code is a normal
    /// `NotFound` evaluation.
    #[tracing::instrument(skip(self))]
    pub async fn validate(&self, cart_total: Money, code: &str) -> Result<CouponEvaluation> {
        let code = CouponCode::normalize(code)?;
        self.evaluate_code(cart_total, &code).await
    }

    /// Evaluation used at order creation.
    ///
    /// Never rejects: a blank code reads as "not found".
    pub async fn evaluate_for_order(&self, cart_total: Money, code: &str) -> Result<CouponEvaluation> {
        match CouponCode::normalize(code) {
            Ok(code) => self.evaluate_code(cart_total, &code).await,
            Err(_) => Ok(evaluate(cart_total, code.trim(), None, self.clock.now())),
        }
    }

    async fn evaluate_code(&self, cart_total: Money, code: &CouponCode) -> Result<CouponEvaluation> {
        let coupon = self.store.find_coupon(code).await?;
        let evaluation = evaluate(cart_total, code.as_str(), coupon.as_ref(), self.clock.now());

        metrics::counter!("coupon_evaluations_total", "outcome" => outcome_label(&evaluation.outcome))
            .increment(1);

        Ok(evaluation)
    }

    pub async fn list(&self) -> Result<Vec<Coupon>> {
        Ok(self.store.list_coupons().await?)
    }

    #[tracing::instrument(skip(self), fields(code = %cmd.code))]
    pub async fn create(&self, cmd: CreateCoupon) -> Result<Coupon> {
        let coupon = Coupon::create(
            &cmd.code,
            cmd.discount,
            cmd.min_purchase,
            cmd.expiry_date.as_deref(),
            self.clock.now(),
        )?;

        let coupon = self.store.insert_coupon(coupon).await?;
        tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "coupon created");
        Ok(coupon)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, coupon_id: CouponId) -> Result<()> {
        if !self.store.delete_coupon(coupon_id).await? {
            return Err(CheckoutError::CouponNotFound(coupon_id));
        }
        tracing::info!(%coupon_id, "coupon deleted");
        Ok(())
    }
}

fn outcome_label(outcome: &CouponOutcome) -> &'static str {
    match outcome {
        CouponOutcome::Applied => "applied",
        CouponOutcome::NotFound => "not_found",
        CouponOutcome::Expired => "expired",
        CouponOutcome::MinimumNotMet { .. } => "minimum_not_met",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use common::FixedClock;
    use domain::{CouponError, Discount};
    use store::{InMemoryStore, StoreError};

    use super::*;

    fn desk() -> (CouponDesk<InMemoryStore>, FixedClock) {
        let clock = FixedClock::new(Utc::now());
        (
            CouponDesk::new(InMemoryStore::new(), Arc::new(clock.clone())),
            clock,
        )
    }

    fn save100() -> CreateCoupon {
        CreateCoupon {
            code: "save100".to_string(),
            discount: Discount::Fixed(Money::from_major(100)),
            min_purchase: Money::from_major(500),
            expiry_date: None,
        }
    }

    #[tokio::test]
    async fn validate_applies_case_insensitively() {
        let (desk, _) = desk();
        desk.create(save100()).await.unwrap();

        let eval = desk.validate(Money::from_major(1000), " Save100 ").await.unwrap();
        assert!(eval.is_applied());
        assert_eq!(eval.code, "SAVE100");
        assert_eq!(eval.final_amount, Money::from_major(900));
    }

    #[tokio::test]
    async fn validate_rejects_blank_code() {
        let (desk, _) = desk();
        let err = desk.validate(Money::from_major(10), "  ").await.unwrap_err();
        assert!(matches!(err, CheckoutError::Coupon(CouponError::EmptyCode)));
    }

    #[tokio::test]
    async fn coupon_expires_as_clock_moves() {
        let (desk, clock) = desk();
        let expiry = (clock.now() + Duration::hours(1)).to_rfc3339();
        desk.create(CreateCoupon {
            expiry_date: Some(expiry),
            ..save100()
        })
        .await
        .unwrap();

        assert!(
            desk.validate(Money::from_major(1000), "SAVE100")
                .await
                .unwrap()
                .is_applied()
        );

        clock.advance(Duration::hours(2));
        let eval = desk.validate(Money::from_major(1000), "SAVE100").await.unwrap();
        assert_eq!(eval.outcome, CouponOutcome::Expired);
    }

    #[tokio::test]
    async fn evaluate_for_order_tolerates_blank_code() {
        let (desk, _) = desk();
        let eval = desk
            .evaluate_for_order(Money::from_major(10), "")
            .await
            .unwrap();
        assert_eq!(eval.outcome, CouponOutcome::NotFound);
        assert_eq!(eval.final_amount, Money::from_major(10));
    }

    #[tokio::test]
    async fn duplicate_code_is_a_store_error() {
        let (desk, _) = desk();
        desk.create(save100()).await.unwrap();
        let err = desk.create(save100()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Store(StoreError::DuplicateCoupon(_))
        ));
    }

    #[tokio::test]
    async fn delete_unknown_coupon_is_not_found() {
        let (desk, _) = desk();
        let coupon = desk.create(save100()).await.unwrap();
        desk.delete(coupon.id).await.unwrap();
        assert!(matches!(
            desk.delete(coupon.id).await,
            Err(CheckoutError::CouponNotFound(_))
        ));
        assert!(desk.list().await.unwrap().is_empty());
    }
}

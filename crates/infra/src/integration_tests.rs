//! End-to-end tests of the payment-to-fulfillment flow over the in-memory
//! store and the in-memory checkout provider.

use std::sync::Arc;

use chrono::Utc;

use tutorhub_auth::{User, UserRole};
use tutorhub_catalog::{Course, Tutor};
use tutorhub_core::{Amount, CourseId, DomainError, TutorId, UserId};
use tutorhub_payments::{Fulfillment, InMemoryCheckout};
use tutorhub_scheduling::{BookingStatus, PaymentStatus, SessionKind};

use crate::checkout::{BookingRequest, CheckoutRequest, CheckoutService, FulfillmentOutcome};
use crate::store::{InMemoryStore, MarketplaceStore};

struct Fixture {
    store: Arc<InMemoryStore>,
    service: CheckoutService,
    learner: UserId,
    tutor: TutorId,
    course: CourseId,
}

async fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let provider = Arc::new(InMemoryCheckout::new());
    let service = CheckoutService::new(
        store.clone(),
        provider,
        "https://app.invalid/success?session_id={CHECKOUT_SESSION_ID}".into(),
        "https://app.invalid/cancel".into(),
    );

    let learner = User::register(UserId::new(), "Lena", "lena@example.com", UserRole::Learner, Utc::now())
        .unwrap();
    let tutor_user =
        User::register(UserId::new(), "Theo", "theo@example.com", UserRole::Tutor, Utc::now())
            .unwrap();
    store.insert_user(learner.clone()).await.unwrap();
    store.insert_user(tutor_user.clone()).await.unwrap();

    let tutor = Tutor::create(TutorId::new(), tutor_user.id, "Theo", "Algebra tutor", Utc::now())
        .unwrap();
    store.insert_tutor(tutor.clone()).await.unwrap();

    let course = Course::publish(
        CourseId::new(),
        tutor.id,
        "Algebra I",
        "Linear equations",
        Amount::positive(5000).unwrap(),
        Amount::positive(2500).unwrap(),
        Utc::now(),
    )
    .unwrap();
    store.insert_course(course.clone()).await.unwrap();

    Fixture {
        store,
        service,
        learner: learner.id,
        tutor: tutor.id,
        course: course.id,
    }
}

#[tokio::test]
async fn enrollment_checkout_flows_end_to_end() {
    let fx = fixture().await;

    let redirect = fx
        .service
        .initiate(
            fx.learner,
            CheckoutRequest {
                course_id: fx.course,
                amount: Amount::positive(5000).unwrap(),
                fulfillment: Fulfillment::Enrollment,
            },
        )
        .await
        .unwrap();
    assert!(!redirect.url.is_empty());

    let intent = fx.service.resolve(&redirect.session_id).await.unwrap();
    assert_eq!(intent.payer_id, fx.learner);
    assert_eq!(intent.course_id, fx.course);

    let outcome = fx
        .service
        .fulfill(Some(fx.learner), &redirect.session_id)
        .await
        .unwrap();
    let FulfillmentOutcome::Enrolled(enrollment) = outcome else {
        panic!("expected enrollment outcome");
    };
    assert_eq!(enrollment.learner_id, fx.learner);
    assert_eq!(enrollment.completed_lessons, 0);
    assert_eq!(enrollment.progress_percent, 0);
}

#[tokio::test]
async fn enrollment_fulfillment_is_idempotent() {
    let fx = fixture().await;

    let first = fx
        .service
        .fulfill_enrollment(fx.learner, fx.course)
        .await
        .unwrap();
    let second = fx
        .service
        .fulfill_enrollment(fx.learner, fx.course)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let all = fx.store.enrollments_for(fx.learner).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn checkout_rejects_existing_enrollment() {
    let fx = fixture().await;
    fx.service
        .fulfill_enrollment(fx.learner, fx.course)
        .await
        .unwrap();

    let err = fx
        .service
        .initiate(
            fx.learner,
            CheckoutRequest {
                course_id: fx.course,
                amount: Amount::positive(5000).unwrap(),
                fulfillment: Fulfillment::Enrollment,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn checkout_rejects_non_learner_and_unknown_payer() {
    let fx = fixture().await;
    let tutor_user = fx.store.tutor(fx.tutor).await.unwrap().unwrap().user_id;

    let request = CheckoutRequest {
        course_id: fx.course,
        amount: Amount::positive(5000).unwrap(),
        fulfillment: Fulfillment::Enrollment,
    };

    let err = fx.service.initiate(tutor_user, request.clone()).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let err = fx.service.initiate(UserId::new(), request).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn session_checkout_books_with_payment() {
    let fx = fixture().await;
    let scheduled_at = "2025-01-10T18:00:00Z".parse().unwrap();

    let redirect = fx
        .service
        .initiate(
            fx.learner,
            CheckoutRequest {
                course_id: fx.course,
                amount: Amount::positive(2500).unwrap(),
                fulfillment: Fulfillment::Session {
                    tutor_id: fx.tutor,
                    scheduled_at,
                    kind: SessionKind::Individual,
                },
            },
        )
        .await
        .unwrap();

    let outcome = fx
        .service
        .fulfill(Some(fx.learner), &redirect.session_id)
        .await
        .unwrap();
    let FulfillmentOutcome::Booked(booking, payment) = outcome else {
        panic!("expected booking outcome");
    };

    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.duration_min, 60);
    assert_eq!(booking.scheduled_at, scheduled_at);
    assert_eq!(payment.booking_id, booking.id);
    assert_eq!(payment.amount.minor(), 2500);
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.transaction_ref, redirect.session_id);
}

#[tokio::test]
async fn duplicate_session_fulfillment_returns_existing_booking() {
    let fx = fixture().await;
    let redirect = fx
        .service
        .initiate(
            fx.learner,
            CheckoutRequest {
                course_id: fx.course,
                amount: Amount::positive(2500).unwrap(),
                fulfillment: Fulfillment::Session {
                    tutor_id: fx.tutor,
                    scheduled_at: Utc::now(),
                    kind: SessionKind::Group,
                },
            },
        )
        .await
        .unwrap();

    let first = fx
        .service
        .fulfill(Some(fx.learner), &redirect.session_id)
        .await
        .unwrap();
    let second = fx
        .service
        .fulfill(Some(fx.learner), &redirect.session_id)
        .await
        .unwrap();

    let (FulfillmentOutcome::Booked(b1, _), FulfillmentOutcome::Booked(b2, _)) = (first, second)
    else {
        panic!("expected booking outcomes");
    };
    assert_eq!(b1.id, b2.id);
    assert_eq!(fx.store.bookings_for(fx.learner).await.unwrap().len(), 1);
}

#[tokio::test]
async fn fulfill_requires_authenticated_user() {
    let fx = fixture().await;
    let err = fx.service.fulfill(None, "cs_whatever").await.unwrap_err();
    assert!(matches!(err, DomainError::Unauthorized));
}

#[tokio::test]
async fn resolving_unknown_session_is_not_found() {
    let fx = fixture().await;
    let err = fx.service.resolve("cs_missing").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[tokio::test]
async fn booking_amount_falls_back_to_session_rate() {
    let fx = fixture().await;
    let (_, payment) = fx
        .service
        .fulfill_booking(BookingRequest {
            learner_id: fx.learner,
            tutor_id: fx.tutor,
            course_id: fx.course,
            scheduled_at: Utc::now(),
            duration_min: None,
            kind: None,
            amount: None,
            transaction_ref: None,
        })
        .await
        .unwrap();
    assert_eq!(payment.amount.minor(), 2500);
    assert!(payment.transaction_ref.starts_with("txn_"));
}

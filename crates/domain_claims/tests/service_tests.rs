//! End-to-end lifecycle tests against the in-memory adapters

use std::sync::Arc;

use domain_claims::testing::{
    FailingRenderer, InMemoryClaimStore, InMemoryOutbox, InMemoryUserDirectory, StubRenderer,
    StubStorage,
};
use domain_claims::{
    ClaimError, ClaimFilter, ClaimPatch, ClaimService, ClaimStatus, ClaimStore, DocumentCategory,
    DocumentKind, DocumentRenderer, Notifier, ObjectStorage, OutboxStore,
};
use domain_party::UserDirectory;
use test_utils::{IntakeRequestBuilder, UserBuilder};

const ADMIN_EMAIL: &str = "claims-desk@claimtrack.app";

struct Harness {
    store: Arc<InMemoryClaimStore>,
    storage: Arc<StubStorage>,
    renderer: Arc<StubRenderer>,
    directory: Arc<InMemoryUserDirectory>,
    outbox: Arc<InMemoryOutbox>,
    service: ClaimService,
}

fn build_service(
    store: Arc<dyn ClaimStore>,
    storage: Arc<dyn ObjectStorage>,
    renderer: Arc<dyn DocumentRenderer>,
    directory: Arc<dyn UserDirectory>,
    outbox: Arc<dyn OutboxStore>,
) -> ClaimService {
    ClaimService::new(
        store,
        storage,
        renderer,
        directory,
        Arc::new(Notifier::new(outbox, ADMIN_EMAIL)),
    )
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryClaimStore::new());
    let storage = Arc::new(StubStorage::new());
    let renderer = Arc::new(StubRenderer::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let outbox = Arc::new(InMemoryOutbox::new());
    let service = build_service(
        store.clone(),
        storage.clone(),
        renderer.clone(),
        directory.clone(),
        outbox.clone(),
    );
    Harness {
        store,
        storage,
        renderer,
        directory,
        outbox,
        service,
    }
}

#[tokio::test]
async fn create_stores_uploads_and_generated_documents() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    assert_eq!(created.tracking_code.as_str().len(), 6);
    let claim = h.service.get(created.claim_id).await.unwrap();
    assert_eq!(claim.status, ClaimStatus::Submitted);
    assert!(claim.attachments.contains(DocumentCategory::Identity));
    assert!(claim.attachments.contains(DocumentCategory::RepresentationLetter));
    assert!(claim.attachments.contains(DocumentCategory::FeeAgreement));

    // Insured drivers keep their uploaded certificate, no affidavit.
    let kinds = h.renderer.rendered_kinds();
    assert!(kinds.contains(&DocumentKind::RepresentationLetter));
    assert!(kinds.contains(&DocumentKind::FeeAgreement));
    assert!(!kinds.contains(&DocumentKind::NoInsuranceAffidavit));

    // 6 uploads plus 2 generated documents.
    assert_eq!(h.storage.uploaded_paths().len(), 8);

    // Claimant confirmation plus admin alert, nothing referral-related.
    let intents = h.outbox.intents();
    assert_eq!(intents.len(), 2);
    assert!(intents.iter().any(|i| i.to == "maria@example.com"));
    assert!(intents.iter().any(|i| i.to == ADMIN_EMAIL));
}

#[tokio::test]
async fn uninsured_driver_gets_affidavit_in_insurance_slot() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::uninsured_driver().build())
        .await
        .unwrap();

    let claim = h.service.get(created.claim_id).await.unwrap();
    let paths = claim.attachments.paths(DocumentCategory::InsuranceCertificate);
    assert_eq!(paths.len(), 1);
    assert!(paths[0].contains("affidavit"));
    assert!(h
        .renderer
        .rendered_kinds()
        .contains(&DocumentKind::NoInsuranceAffidavit));
}

#[tokio::test]
async fn create_with_referral_notifies_agent_and_organizer() {
    let h = harness();
    let organizer = UserBuilder::organizer().build();
    let producer = UserBuilder::producer().referred_by(&organizer).build();
    h.directory.add(organizer.clone());
    h.directory.add(producer.clone());

    let request = IntakeRequestBuilder::insured_driver()
        .referral_code(producer.id.to_string())
        .build();
    let created = h.service.create(request).await.unwrap();

    let claim = h.service.get(created.claim_id).await.unwrap();
    assert_eq!(claim.created_by, Some(producer.id));

    let recipients: Vec<String> = h.outbox.intents().into_iter().map(|i| i.to).collect();
    assert_eq!(recipients.len(), 4);
    assert!(recipients.contains(&producer.email));
    assert!(recipients.contains(&organizer.email));
}

#[tokio::test]
async fn unknown_referral_code_is_non_fatal() {
    let h = harness();
    let request = IntakeRequestBuilder::insured_driver()
        .referral_code("not-a-user-id")
        .build();
    let created = h.service.create(request).await.unwrap();

    let claim = h.service.get(created.claim_id).await.unwrap();
    assert_eq!(claim.created_by, None);
    assert_eq!(h.outbox.intents().len(), 2);
}

#[tokio::test]
async fn invalid_intake_touches_nothing() {
    let h = harness();
    let request = IntakeRequestBuilder::insured_driver()
        .without_document(DocumentCategory::Identity)
        .build();

    let err = h.service.create(request).await.unwrap_err();
    assert!(matches!(err, ClaimError::Validation(_)));
    assert!(h.store.is_empty());
    assert!(h.storage.uploaded_paths().is_empty());
    assert!(h.outbox.intents().is_empty());
}

#[tokio::test]
async fn failed_render_leaves_slot_empty_but_claim_is_filed() {
    let store = Arc::new(InMemoryClaimStore::new());
    let service = build_service(
        store.clone(),
        Arc::new(StubStorage::new()),
        Arc::new(FailingRenderer),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryOutbox::new()),
    );

    let created = service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();
    let claim = service.get(created.claim_id).await.unwrap();
    assert!(!claim.attachments.contains(DocumentCategory::RepresentationLetter));
    assert!(!claim.attachments.contains(DocumentCategory::FeeAgreement));
    assert!(claim.attachments.contains(DocumentCategory::Identity));
}

#[tokio::test]
async fn tracking_lookup_requires_matching_national_id() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();
    let code = created.tracking_code.as_str().to_string();

    let view = h.service.track(&code, "30123456").await.unwrap();
    assert_eq!(view.status, ClaimStatus::Submitted);

    // A correct code with the wrong national id is indistinguishable from
    // an unknown code.
    let err = h.service.track(&code, "99999999").await.unwrap_err();
    assert!(matches!(err, ClaimError::NotFound(_)));
    let err = h.service.track("ABC123", "30123456").await.unwrap_err();
    assert!(matches!(err, ClaimError::NotFound(_)));
}

#[tokio::test]
async fn update_status_fans_out_and_enforces_the_machine() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    let claim = h
        .service
        .update_status(created.claim_id, ClaimStatus::Negotiating)
        .await
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Negotiating);

    let intents = h.outbox.intents();
    // 2 from intake plus claimant and admin copies of the change.
    assert_eq!(intents.len(), 4);
    assert!(intents
        .iter()
        .any(|i| i.to == "maria@example.com" && i.subject.contains("negotiation")));

    let err = h
        .service
        .update_status(created.claim_id, ClaimStatus::Received)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::InvalidStatusTransition { .. }));
}

#[tokio::test]
async fn assign_handler_checks_role_and_auto_advances_once() {
    let h = harness();
    let handler = UserBuilder::handler().build();
    let producer = UserBuilder::producer().build();
    h.directory.add(handler.clone());
    h.directory.add(producer.clone());

    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    let err = h
        .service
        .assign_handler(created.claim_id, producer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::Permission(_)));

    let claim = h
        .service
        .assign_handler(created.claim_id, handler.id)
        .await
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Received);
    assert_eq!(claim.handler, Some(handler.id));

    // Reassignment keeps the status where it is.
    let claim = h
        .service
        .update_status(created.claim_id, ClaimStatus::Initiated)
        .await
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Initiated);
    let claim = h
        .service
        .assign_handler(created.claim_id, handler.id)
        .await
        .unwrap();
    assert_eq!(claim.status, ClaimStatus::Initiated);
}

#[tokio::test]
async fn messages_and_notes_accumulate() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    h.service
        .append_message(created.claim_id, "lucia@example.com", "Please resend page 2".into())
        .await
        .unwrap();
    let claim = h
        .service
        .append_note(created.claim_id, "lucia@example.com", "Insurer slow to respond".into())
        .await
        .unwrap();

    assert_eq!(claim.messages.len(), 1);
    assert_eq!(claim.notes.len(), 1);
    assert_eq!(claim.messages[0].text, "Please resend page 2");
}

#[tokio::test]
async fn patch_updates_whitelisted_fields_only() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    let patch = ClaimPatch {
        claimant_phone: Some("+54 11 4444 9999".into()),
        bank_account: Some("2850590940090418135201".into()),
        ..ClaimPatch::default()
    };
    let claim = h.service.apply_patch(created.claim_id, patch).await.unwrap();
    assert_eq!(claim.claimant.phone.as_deref(), Some("+54 11 4444 9999"));
    assert!(claim.bank_account.is_some());
    assert_eq!(claim.status, ClaimStatus::Submitted);
}

#[tokio::test]
async fn signed_urls_resolve_per_category_and_index() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    let url = h
        .service
        .file_url(created.claim_id, DocumentCategory::Identity, 0)
        .await
        .unwrap();
    assert!(url.starts_with("https://files.test/claims/"));
    assert!(url.contains("expires="));

    let err = h
        .service
        .file_url(created.claim_id, DocumentCategory::Photos, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaimError::NotFound(_)));
}

#[tokio::test]
async fn remove_deletes_record_and_stored_files() {
    let h = harness();
    let created = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();

    h.service.remove(created.claim_id).await.unwrap();
    assert!(h.store.is_empty());
    assert_eq!(h.storage.removed_paths().len(), 8);

    let err = h.service.get(created.claim_id).await.unwrap_err();
    assert!(matches!(err, ClaimError::NotFound(_)));
}

#[tokio::test]
async fn organizer_listing_covers_the_downline() {
    let h = harness();
    let organizer = UserBuilder::organizer().build();
    let producer = UserBuilder::producer().referred_by(&organizer).build();
    h.directory.add(organizer.clone());
    h.directory.add(producer.clone());

    h.service
        .create(
            IntakeRequestBuilder::insured_driver()
                .referral_code(producer.id.to_string())
                .build(),
        )
        .await
        .unwrap();
    h.service
        .create(
            IntakeRequestBuilder::insured_driver()
                .email("otro@example.com")
                .build(),
        )
        .await
        .unwrap();

    let network = h.service.list_for_organizer(organizer.id).await.unwrap();
    assert_eq!(network.len(), 1);
    assert_eq!(network[0].created_by, Some(producer.id));

    let all = h.service.list(&ClaimFilter::all()).await.unwrap();
    assert_eq!(all.len(), 2);
    let submitted = h
        .service
        .list(&ClaimFilter::with_status(ClaimStatus::Submitted))
        .await
        .unwrap();
    assert_eq!(submitted.len(), 2);
}

#[tokio::test]
async fn injured_driver_needs_medical_records() {
    let h = harness();
    let request = IntakeRequestBuilder::uninsured_driver().flag_injury().build();
    let err = h.service.create(request).await.unwrap_err();
    assert!(matches!(err, ClaimError::Validation(msg) if msg.contains("medical")));

    let request = IntakeRequestBuilder::uninsured_driver()
        .flag_injury()
        .with_file(test_utils::fixtures::document(DocumentCategory::MedicalRecords))
        .build();
    h.service.create(request).await.unwrap();
}

#[tokio::test]
async fn duplicate_tracking_codes_are_refused_by_the_store() {
    let h = harness();
    let first = h
        .service
        .create(IntakeRequestBuilder::insured_driver().build())
        .await
        .unwrap();
    let mut clone = h.store.get(first.claim_id).await.unwrap().unwrap();
    clone.id = core_kernel::ClaimId::new_v7();

    let err = h.store.insert(&clone).await.unwrap_err();
    assert!(err.is_conflict());
}

//! End-to-end buyer flows against the in-memory backend.

use std::sync::Arc;

use chrono::NaiveDate;
use optic_commerce::cart::{BackendCall, MemoryBackend, MemoryCartIdStore};
use optic_commerce::prelude::*;
use optic_commerce::prescription::{MemoryPrescriptionStore, MemoryUploader};

const FRAME: &str = "variant-aviator";
const CONTACTS: &str = "variant-daily-multifocal";
const DONATION: &str = "variant-donation";

fn backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new(Currency::USD)
            .with_product(FRAME, "Aviator", Money::from_major(95, Currency::USD))
            .with_product(CONTACTS, "Daily Multifocal", Money::from_major(45, Currency::USD))
            .with_product(DONATION, "Donate a pair", Money::from_major(5, Currency::USD)),
    )
}

fn service(backend: Arc<MemoryBackend>) -> CartService {
    CartService::new(
        backend,
        Arc::new(MemoryCartIdStore::new()),
        CartRules::default().with_donation(MerchandiseId::new(DONATION)),
    )
}

fn engine() -> ConfiguratorEngine {
    ConfiguratorEngine::new(
        Arc::new(OptionTree::eyeglasses().unwrap()),
        Money::from_major(95, Currency::USD),
    )
}

fn configure(engine: &ConfiguratorEngine, keys: &[&str]) -> ConfiguredLens {
    let mut path = ConfigurationPath::new();
    for (i, key) in keys.iter().enumerate() {
        path = engine.select(&path, i, key).unwrap().path;
    }
    engine.finish(&path).unwrap()
}

fn contacts_product() -> ContactLensProduct {
    ContactLensProduct {
        title: "Daily Multifocal".into(),
        merchandise_id: MerchandiseId::new(CONTACTS),
        astigmatism: false,
        multifocal: true,
        base_curves: vec!["8.5".into()],
        diameters: vec!["14.1".into()],
    }
}

#[tokio::test]
async fn eyeglasses_manual_prescription_reaches_cart() {
    let backend = backend();
    let service = service(backend.clone());
    let engine = engine();
    let lens = configure(
        &engine,
        &["progressive", "standard", "light-responsive", "transitions-xtractive", "grey"],
    );
    assert!(lens.multifocal);

    let wizard = EyeglassesWizard::with_today(lens.multifocal, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
        .apply(EyeglassesEvent::Choose(EntryMethod::Manual))
        .and_then(|w| {
            w.apply(EyeglassesEvent::SetPatient(PatientInfo {
                name: "Ada Lovelace".into(),
                shipping_state: "NY".into(),
                date_of_birth: "1990-12-10".into(),
            }))
        })
        .and_then(|w| w.apply(EyeglassesEvent::Next))
        .and_then(|w| {
            w.apply(EyeglassesEvent::SetEye(
                Eye::Right,
                EyeRx::default().with_sph("+1.25").with_add("+2.00"),
            ))
        })
        .and_then(|w| {
            w.apply(EyeglassesEvent::SetEye(
                Eye::Left,
                EyeRx::default()
                    .with_sph("+1.00")
                    .with_cyl_axis("-0.50", "90")
                    .with_add("+2.00"),
            ))
        })
        .and_then(|w| w.apply(EyeglassesEvent::Next))
        .and_then(|w| w.apply(EyeglassesEvent::SetPd(PupillaryDistance::single("63"))))
        .and_then(|w| w.apply(EyeglassesEvent::SetConfirmed(true)))
        .and_then(|w| w.apply(EyeglassesEvent::Next))
        .unwrap();

    let request = wizard.line_request(&lens, MerchandiseId::new(FRAME)).unwrap();
    let cart = service.add_request(request).await.unwrap();

    let line = &cart.lines[0];
    assert_eq!(line.attributes.get("Lens Type"), Some("Progressive"));
    assert_eq!(line.attributes.get("OS AXIS"), Some("90"));
    assert_eq!(line.attributes.get("_price_override"), Some("420.00"));
    assert_eq!(line.unit_price.amount_cents, 42000);

    let keys = line.attributes.keys();
    let tail = &keys[keys.len() - 2..];
    assert_eq!(tail, ["FocalProductType", "_price_override"]);
}

#[tokio::test]
async fn scenario_c_two_eyeglasses_lines_issue_no_donation_add() {
    let backend = backend();
    let service = service(backend.clone());
    let engine = engine();

    for keys in [
        ["single-vision", "standard", "classic", "classic"],
        ["reading", "thin", "blue-light", "premium-anti-glare"],
    ] {
        let lens = configure(&engine, &keys);
        let wizard = EyeglassesWizard::for_lens(&lens)
            .apply(EyeglassesEvent::Choose(EntryMethod::Deferred))
            .unwrap();
        service
            .add_request(wizard.line_request(&lens, MerchandiseId::new(FRAME)).unwrap())
            .await
            .unwrap();
    }

    let status = service.donation_status().unwrap();
    assert!(status.qualifying);
    assert_eq!(backend.adds_of(&MerchandiseId::new(DONATION)), 0);
    assert_eq!(backend.removes(), 0);
}

#[tokio::test]
async fn scenario_d_contacts_single_eye_add() {
    let backend = backend();
    let service = service(backend.clone());

    let wizard = ContactsWizard::new(contacts_product())
        .apply(ContactsEvent::SetRx(
            Eye::Right,
            EyeRx::default().with_sph("-2.00").with_add("+1.50"),
        ))
        .and_then(|w| w.apply(ContactsEvent::SetQuantity(Eye::Right, 4)))
        .and_then(|w| w.apply(ContactsEvent::SetEnabled(Eye::Left, false)))
        .and_then(|w| w.apply(ContactsEvent::Next))
        .and_then(|w| w.apply(ContactsEvent::Verify(VerificationChoice::Deferred)))
        .and_then(|w| w.apply(ContactsEvent::Next))
        .unwrap();

    let cart = service
        .add_line_items_independently(wizard.line_requests().unwrap())
        .await
        .unwrap();

    let adds: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, BackendCall::Add(_)))
        .collect();
    assert_eq!(adds.len(), 1);

    let line = &cart.lines[0];
    assert_eq!(line.quantity, 4);
    assert_eq!(line.attributes.get("Eye"), Some("Right (OD)"));
    assert_eq!(line.attributes.get("SPH"), Some("-2.00"));
    assert_eq!(line.attributes.get("ADD"), Some("+1.50"));
    assert_eq!(line.attributes.get("BC"), Some("8.5"));
    assert_eq!(line.attributes.get("DIA"), Some("14.1"));
    assert!(service.donation_status().unwrap().qualifying);
}

#[tokio::test]
async fn contacts_upload_for_signed_in_customer_is_saved() {
    let uploader = MemoryUploader::new();
    let store = MemoryPrescriptionStore::new();
    let customer = CustomerId::new("customer-1");

    let at_verification = ContactsWizard::new(contacts_product())
        .apply(ContactsEvent::SetRx(
            Eye::Left,
            EyeRx::default().with_sph("-1.00").with_add("+1.00"),
        ))
        .and_then(|w| w.apply(ContactsEvent::SetEnabled(Eye::Right, false)))
        .and_then(|w| w.apply(ContactsEvent::Next))
        .unwrap();

    let done = optic_commerce::prescription::contacts::upload_verification(
        &at_verification,
        &uploader,
        Some((&store as &dyn PrescriptionStore, &customer)),
        UploadFile::new("rx.pdf", "application/pdf", vec![1, 2, 3]),
    )
    .await
    .and_then(|w| w.apply(ContactsEvent::Next))
    .unwrap();

    let requests = done.line_requests().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].attributes.get("Prescription"), Some("Uploaded"));
    assert_eq!(store.list(&customer, PrescriptionCategory::ContactLenses).await.unwrap().len(), 1);
}

#[tokio::test]
async fn donation_removed_when_contacts_drop_below_threshold() {
    let backend = backend();
    let service = service(backend.clone());

    let cart = service
        .add_line_item(
            MerchandiseId::new(CONTACTS),
            4,
            vec![Attribute::new("FocalProductType", "ContactLenses")].into(),
        )
        .await
        .unwrap();
    let contacts_line = cart.lines[0].id.clone();
    service
        .add_line_item(MerchandiseId::new(DONATION), 1, AttributeList::new())
        .await
        .unwrap();

    let cart = service.update_line_item(contacts_line, 3).await.unwrap();
    assert!(cart.line_for(&MerchandiseId::new(DONATION)).is_none());
    assert_eq!(backend.removes(), 1);

    let totals = service.display_totals(true).unwrap();
    assert_eq!(totals.subtotal.amount_cents, 13500);
    assert_eq!(totals.discount.amount_cents, 2700);
}

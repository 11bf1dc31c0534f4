use pharmacy_receipts::{
    config::Config,
    db::{
        models::{MedicineItem, NewReceipt},
        ReceiptStore, SupabaseClient,
    },
};
use rand::Rng;

fn item(name: &str, price: f64, rng: &mut impl Rng) -> MedicineItem {
    MedicineItem {
        name: name.to_string(),
        qty: rng.gen_range(1..=5),
        price,
    }
}

fn get_seed_data() -> Vec<NewReceipt> {
    let mut rng = rand::thread_rng();
    let seed_receipts = vec![
        (
            "Green Cross Pharmacy",
            "user123",
            vec![item("Aspirin", 4.99, &mut rng), item("Omeprazole", 12.5, &mut rng)],
        ),
        (
            "Green Cross Pharmacy",
            "patient456",
            vec![item("Lisinopril", 9.75, &mut rng)],
        ),
        (
            "Nile Drugstore",
            "customer789",
            vec![
                item("Amoxicillin", 15.0, &mut rng),
                item("Metformin", 6.4, &mut rng),
                item("Albuterol", 27.99, &mut rng),
            ],
        ),
        (
            "Nile Drugstore",
            "client101",
            vec![item("Levothyroxine", 11.2, &mut rng), item("Gabapentin", 18.3, &mut rng)],
        ),
        (
            "Corner Chemist",
            "patient456",
            vec![item("Amlodipine", 7.25, &mut rng), item("Metoprolol", 8.6, &mut rng)],
        ),
    ];

    seed_receipts
        .into_iter()
        .map(|(pharmacy, patient, items)| {
            let total = items.iter().map(MedicineItem::line_total).sum::<f64>();
            NewReceipt {
                pharmacy_name: pharmacy.to_string(),
                patient_name: patient.to_string(),
                total: (total * 100.0).round() / 100.0,
                items,
            }
        })
        .collect()
}

pub async fn seed_receipts(store: &dyn ReceiptStore) -> Result<(), Box<dyn std::error::Error>> {
    for receipt in get_seed_data() {
        let created = store.create_receipt(&receipt).await?;
        log::info!("Seeded receipt {} for {}", created.id, created.patient_name);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let store = SupabaseClient::from_config(&config);
    seed_receipts(&store).await?;
    Ok(())
}

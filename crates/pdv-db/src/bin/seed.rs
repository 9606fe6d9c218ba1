//! # Seed Data Generator
//!
//! Populates a development database with operators, customers, products
//! and sales.
//!
//! ## Usage
//! ```bash
//! # Defaults: 50 customers, all catalog products, 200 sales
//! cargo run -p pdv-db --bin seed
//!
//! # Custom amounts
//! cargo run -p pdv-db --bin seed -- --customers 500 --sales 5000
//!
//! # Specify database path (otherwise PDV_DATABASE_PATH or ./pdv.db)
//! cargo run -p pdv-db --bin seed -- --db ./data/loja.db
//!
//! # More output
//! RUST_LOG=debug cargo run -p pdv-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Operators: one per register (`Caixa 1`, `Caixa 2`, ...)
//! - Customers: valid CPFs (check digits computed), cities across UFs
//! - Products: Brazilian grocery catalog in Portuguese categories, EAN-13
//!   barcodes, stock between 0 and 60 so some items show as low stock
//! - Sales: spread over the last 30 days, recorded with
//!   `SaleRepository::record` so every subtotal is derived on write

use chrono::{Duration, Local};
use std::env;
use std::error::Error;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pdv_core::derivation::line_subtotal;
use pdv_core::validation::cpf_check_digits;
use pdv_core::{
    Customer, Money, NewCustomer, NewProduct, NewSale, NewUser, PaymentMethod, Product,
    ProductFilter, SaleFilter, SaleLine, SaleStatus, User,
};
use pdv_db::{Database, DbConfig};

/// Catalog by category: (name, price in centavos)
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Mercearia",
        &[
            ("Arroz Branco 5kg", 2599),
            ("Feijão Carioca 1kg", 899),
            ("Açúcar Refinado 1kg", 459),
            ("Café Torrado 500g", 1890),
            ("Óleo de Soja 900ml", 749),
            ("Macarrão Espaguete 500g", 429),
            ("Farinha de Trigo 1kg", 549),
            ("Sal Refinado 1kg", 299),
            ("Molho de Tomate 340g", 319),
            ("Biscoito Cream Cracker 400g", 589),
        ],
    ),
    (
        "Bebidas",
        &[
            ("Água Mineral 500ml", 250),
            ("Refrigerante Cola 2L", 999),
            ("Suco de Laranja 1L", 879),
            ("Guaraná 2L", 849),
            ("Cerveja Lata 350ml", 429),
            ("Chá Mate 1,5L", 629),
        ],
    ),
    (
        "Laticínios",
        &[
            ("Leite Integral 1L", 549),
            ("Queijo Mussarela 500g", 2890),
            ("Manteiga 200g", 1199),
            ("Iogurte Natural 170g", 329),
            ("Requeijão 200g", 799),
        ],
    ),
    (
        "Padaria",
        &[
            ("Pão Francês kg", 1590),
            ("Pão de Forma 500g", 899),
            ("Bolo de Fubá", 1450),
            ("Pão de Queijo 400g", 1290),
        ],
    ),
    (
        "Limpeza",
        &[
            ("Detergente 500ml", 249),
            ("Sabão em Pó 1kg", 1399),
            ("Água Sanitária 1L", 499),
            ("Desinfetante 500ml", 679),
            ("Esponja Multiuso", 199),
        ],
    ),
];

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Camila", "Diego", "Eduarda", "Felipe", "Gabriela", "Henrique", "Isabela",
    "João", "Larissa", "Marcos", "Natália", "Otávio", "Patrícia", "Rafael", "Sofia", "Thiago",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Souza", "Oliveira", "Santos", "Pereira", "Costa", "Rodrigues", "Almeida", "Lima",
    "Carvalho",
];

/// (city, UF, CEP prefix)
const CITIES: &[(&str, &str, &str)] = &[
    ("São Paulo", "SP", "01"),
    ("Rio de Janeiro", "RJ", "20"),
    ("Belo Horizonte", "MG", "30"),
    ("Curitiba", "PR", "80"),
    ("Porto Alegre", "RS", "90"),
    ("Salvador", "BA", "40"),
    ("Recife", "PE", "50"),
    ("Fortaleza", "CE", "60"),
];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Dinheiro,
    PaymentMethod::Pix,
    PaymentMethod::CartaoDebito,
    PaymentMethod::CartaoCredito,
    PaymentMethod::Boleto,
];

const OPERATORS: usize = 3;

struct Options {
    customers: usize,
    sales: usize,
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let Some(options) = parse_args(env::args().skip(1).collect()) else {
        print_help();
        return Ok(());
    };

    let mut config = DbConfig::from_env()?;
    if let Some(path) = options.db_path {
        config.database_path = path.into();
    }

    info!(
        path = %config.database_path.display(),
        customers = options.customers,
        sales = options.sales,
        "PDV seed data generator"
    );

    let db = Database::new(config).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            products = existing,
            "Database already has products; skipping seed. Delete the database file to regenerate."
        );
        return Ok(());
    }

    let start = Instant::now();

    let operators = seed_operators(&db).await?;
    let customers = seed_customers(&db, options.customers).await?;
    let products = seed_products(&db).await?;
    let recorded = seed_sales(&db, options.sales, &operators, &customers, &products).await?;

    info!(
        operators = operators.len(),
        customers = customers.len(),
        products = products.len(),
        sales = recorded,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Seed complete"
    );

    let low_stock = db
        .products()
        .list(&[ProductFilter::Active, ProductFilter::low_stock()])
        .await?;
    let completed_today = db
        .sales()
        .list(&[SaleFilter::Completed, SaleFilter::today()])
        .await?;
    info!(
        low_stock = low_stock.len(),
        completed_today = completed_today.len(),
        "Verification queries"
    );

    Ok(())
}

/// `RUST_LOG` wins; otherwise info, with sqlx statement logging quieted.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Returns `None` when help was requested.
fn parse_args(args: Vec<String>) -> Option<Options> {
    let mut options = Options {
        customers: 50,
        sales: 200,
        db_path: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    options.customers = value.parse().unwrap_or(options.customers);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if let Some(value) = args.get(i + 1) {
                    options.sales = value.parse().unwrap_or(options.sales);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    options.db_path = Some(value.clone());
                    i += 1;
                }
            }
            "--help" | "-h" => return None,
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    Some(options)
}

fn print_help() {
    println!("PDV Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --customers <N>  Customers to generate (default: 50)");
    println!("  -s, --sales <N>      Sales to record (default: 200)");
    println!("  -d, --db <PATH>      Database file (default: $PDV_DATABASE_PATH or ./pdv.db)");
    println!("  -h, --help           Show this help message");
}

async fn seed_operators(db: &Database) -> Result<Vec<User>, Box<dyn Error>> {
    let mut operators = Vec::with_capacity(OPERATORS);
    for n in 1..=OPERATORS {
        let user = db
            .users()
            .insert(NewUser {
                name: format!("Caixa {n}"),
                email: format!("caixa{n}@loja.example.com"),
            })
            .await?;
        operators.push(user);
    }
    Ok(operators)
}

async fn seed_customers(db: &Database, count: usize) -> Result<Vec<Customer>, Box<dyn Error>> {
    let mut customers = Vec::with_capacity(count);

    for seed in 0..count {
        let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
        let last = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];
        let (city, state, cep_prefix) = CITIES[seed % CITIES.len()];

        let input = NewCustomer {
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}{}@example.com",
                ascii_slug(first),
                ascii_slug(last),
                seed
            ),
            phone: Some(format!("(11) 9{:04}-{:04}", seed % 10_000, (seed * 37) % 10_000)),
            tax_id: generate_cpf(seed),
            address: Some(format!("Rua {} {}, {}", last, first, 10 + seed % 990)),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            postal_code: Some(format!("{cep_prefix}{:03}-{:03}", seed % 1000, (seed * 7) % 1000)),
        };

        match db.customers().insert(input).await {
            Ok(customer) => customers.push(customer),
            Err(e) => warn!(seed, error = %e, "Failed to insert customer"),
        }
    }

    info!(count = customers.len(), "Customers generated");
    Ok(customers)
}

async fn seed_products(db: &Database) -> Result<Vec<Product>, Box<dyn Error>> {
    let mut products = Vec::new();
    let mut seed = 0usize;

    for (category, items) in CATALOG {
        for (name, price_cents) in items.iter() {
            let input = NewProduct {
                description: Some(format!("{name} ({category})")),
                stock: ((seed * 13) % 61) as i64,
                category: Some(category.to_string()),
                barcode: Some(format!("789{:010}", 1_000 + seed)),
                ..NewProduct::new(*name, Money::from_cents(*price_cents))
            };

            match db.products().insert(input).await {
                Ok(product) => products.push(product),
                Err(e) => warn!(name = %name, error = %e, "Failed to insert product"),
            }
            seed += 1;
        }
    }

    info!(count = products.len(), "Products generated");
    Ok(products)
}

async fn seed_sales(
    db: &Database,
    count: usize,
    operators: &[User],
    customers: &[Customer],
    products: &[Product],
) -> Result<usize, Box<dyn Error>> {
    if operators.is_empty() || customers.is_empty() || products.is_empty() {
        warn!("Nothing to sell: operators, customers or products missing");
        return Ok(0);
    }

    let today = Local::now().date_naive();
    let mut recorded = 0;

    for seed in 0..count {
        let line_count = 1 + seed % 4;
        let mut lines = Vec::with_capacity(line_count);
        let mut total = Money::zero();

        for k in 0..line_count {
            let product = &products[(seed * 7 + k * 3) % products.len()];
            let quantity = 1 + ((seed + k) % 5) as i64;
            total += line_subtotal(quantity, product.price)?;
            lines.push(SaleLine {
                product_id: product.id.clone(),
                quantity,
                unit_price: None,
            });
        }

        // Every fifth sale gets 5% off.
        let discount = if seed % 5 == 0 {
            Money::from_cents(total.cents() / 20)
        } else {
            Money::zero()
        };

        let status = match seed % 10 {
            0 => SaleStatus::Cancelled,
            1 | 2 => SaleStatus::Pending,
            _ => SaleStatus::Completed,
        };

        let input = NewSale {
            customer_id: customers[seed % customers.len()].id.clone(),
            user_id: operators[seed % operators.len()].id.clone(),
            sale_date: today - Duration::days((seed % 30) as i64),
            total,
            discount,
            payment_method: PAYMENT_METHODS[seed % PAYMENT_METHODS.len()],
            status,
            notes: None,
        };

        match db.sales().record(input, lines).await {
            Ok(_) => recorded += 1,
            Err(e) => warn!(seed, error = %e, "Failed to record sale"),
        }

        if recorded > 0 && recorded % 100 == 0 {
            info!(recorded, "Recording sales...");
        }
    }

    Ok(recorded)
}

/// A CPF with valid check digits, distinct per seed.
fn generate_cpf(seed: usize) -> String {
    let mut base = 100_000_001 + (seed as u64 * 7_919) % 899_999_998;
    let mut digits = to_digits(base);
    while digits.windows(2).all(|w| w[0] == w[1]) {
        base += 1;
        digits = to_digits(base);
    }

    let [d1, d2] = cpf_check_digits(&digits);
    let body: String = digits.iter().map(|d| char::from(b'0' + *d as u8)).collect();
    format!("{}.{}.{}-{}{}", &body[0..3], &body[3..6], &body[6..9], d1, d2)
}

fn to_digits(base: u64) -> Vec<u32> {
    format!("{base:09}")
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect()
}

/// Lowercase ASCII version of a name for email local parts.
fn ascii_slug(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'Á' => 'a',
            'é' | 'ê' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'ô' | 'õ' | 'Ó' | 'Ô' => 'o',
            'ú' | 'Ú' => 'u',
            'ç' => 'c',
            other => other.to_ascii_lowercase(),
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

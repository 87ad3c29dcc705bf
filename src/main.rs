//! LiveMart Checkout - terminal front end for the cart and checkout core

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use livemart_checkout::{
    config::Config, CartLine, CartStore, Checkout, CheckoutEvent, CouponCode, FileStorage, LiveMartClient,
    PaymentMethod, PaymentOutcome, PriceBreakdown, ProductId, Services, ShippingForm, Won,
};

#[derive(Debug, Parser)]
#[command(name = "livemart-checkout", about = "LiveMart cart and checkout", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the cart
    Show,
    /// Add a product, merging with an existing line
    Add {
        product_id: i64,
        name: String,
        /// Unit price in won at the time of adding
        price: u64,
        #[arg(default_value = "1")]
        quantity: NonZeroU32,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Remove a product
    Remove { product_id: i64 },
    /// Set a quantity; zero or less removes the line
    Set {
        product_id: i64,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Price the selection, optionally previewing a coupon
    Quote {
        #[arg(long)]
        coupon: Option<CouponCode>,
        /// Only these product ids (comma separated); defaults to the whole cart
        #[arg(long, value_delimiter = ',')]
        only: Vec<i64>,
    },
    /// Place an order for the selection
    Checkout {
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        postal_code: String,
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        detail: String,
        #[arg(long, default_value = "")]
        memo: String,
        #[arg(long, default_value = "card")]
        payment_method: PaymentMethod,
        #[arg(long)]
        coupon: Option<CouponCode>,
        #[arg(long, value_delimiter = ',')]
        only: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&cli.config.log_level).unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.config;
    let mut store = CartStore::open(FileStorage::new(&config.cart_dir));

    match cli.command {
        Command::Show => print_cart(&store),
        Command::Add { product_id, name, price, quantity, image_url } => {
            let mut line = CartLine::new(ProductId::new(product_id), name, Won::new(price), quantity);
            line.image_url = image_url;
            store.add_item(line)?;
            print_cart(&store);
        }
        Command::Remove { product_id } => {
            store.remove_item(ProductId::new(product_id))?;
            print_cart(&store);
        }
        Command::Set { product_id, quantity } => {
            store.update_quantity(ProductId::new(product_id), quantity)?;
            print_cart(&store);
        }
        Command::Clear => {
            store.clear_cart()?;
            println!("cart cleared");
        }
        Command::Quote { coupon, only } => {
            let mut checkout = Checkout::new(store.cart(), config.pricing_policy());
            if !only.is_empty() { checkout.set_selection(only.into_iter().map(ProductId::new)); }
            if let Some(code) = coupon {
                let client = LiveMartClient::new(config.http_config())?;
                if let Err(e) = checkout.apply_coupon(store.cart(), code, &client).await {
                    println!("{e}");
                }
            }
            print_quote(&checkout.quote(store.cart()));
        }
        Command::Checkout { recipient, phone, postal_code, address, detail, memo, payment_method, coupon, only } => {
            let session = config.session().context("--user-id or LIVEMART_USER_ID is required to place an order")?;
            let client = LiveMartClient::new(config.http_config())?;
            let services = Services::from_client(&client);

            let mut checkout = Checkout::new(store.cart(), config.pricing_policy());
            if !only.is_empty() { checkout.set_selection(only.into_iter().map(ProductId::new)); }
            if let Some(code) = coupon {
                if let Err(e) = checkout.apply_coupon(store.cart(), code, services.coupons).await {
                    println!("{e}; continuing without a coupon");
                }
            }
            anyhow::ensure!(checkout.can_submit(store.cart()), "nothing selected to order");
            print_quote(&checkout.quote(store.cart()));

            let form = ShippingForm {
                recipient_name: recipient,
                recipient_phone: phone,
                postal_code,
                address,
                address_detail: detail,
                delivery_memo: memo,
            };
            let result = checkout.submit(&mut store, &form, payment_method, &session, &services).await;
            for event in checkout.take_events().into_iter().filter(CheckoutEvent::is_user_facing) {
                if let CheckoutEvent::PaymentFailed { reason, .. } = event {
                    println!("payment was not completed ({reason}); you can pay from the order page");
                }
            }
            let receipt = result?;
            println!("order {} placed for {}", receipt.order_number, receipt.amount);
            if receipt.payment == PaymentOutcome::Accepted { println!("payment accepted"); }
            println!("details: {}", receipt.detail_path());
        }
    }
    Ok(())
}

fn print_cart(store: &CartStore<FileStorage>) {
    if store.cart().is_empty() {
        println!("cart is empty");
        return;
    }
    for line in store.lines() {
        println!("{:>8}  {:<32} {:>12} x {:<4} {:>12}", line.product_id, line.name, line.unit_price, line.quantity, line.line_total());
    }
    println!("total {}", store.total_amount());
}

fn print_quote(quote: &PriceBreakdown) {
    println!("subtotal  {}", quote.subtotal);
    println!("shipping  {}", quote.shipping_fee);
    println!("discount  {}", quote.discount);
    println!("total     {}", quote.total);
}

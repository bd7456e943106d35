//! Table formatting for CLI output

use abel_sdk::{Invoice, Payment, Project};
use chrono::{DateTime, Local, Utc};
use tabled::{settings::Style, Table, Tabled};

/// Format a timestamp as local YY-MM-DD HH:MM
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%y-%m-%d %H:%M")
        .to_string()
}

fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

/// Display projects in table format
pub fn display_projects(projects: &[Project]) {
    #[derive(Tabled)]
    struct ProjectRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Type")]
        project_type: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Budget")]
        budget: String,
        #[tabled(rename = "Deadline")]
        deadline: String,
    }

    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|project| ProjectRow {
            id: project.id.clone(),
            title: project.title.clone(),
            project_type: project.project_type.clone(),
            status: project.status.clone(),
            budget: format_amount(project.budget, &project.currency),
            deadline: project
                .deadline
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Display invoices in table format
pub fn display_invoices(invoices: &[Invoice]) {
    #[derive(Tabled)]
    struct InvoiceRow {
        #[tabled(rename = "Number")]
        number: String,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Due")]
        due: String,
    }

    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|invoice| InvoiceRow {
            number: invoice.invoice_number.clone(),
            id: invoice.id.clone(),
            amount: format_amount(invoice.amount, &invoice.currency),
            status: invoice.status.clone(),
            due: format_timestamp(&invoice.due_date),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

/// Display one invoice with its line items
pub fn display_invoice_details(invoice: &Invoice) {
    println!("Invoice {} ({})", invoice.invoice_number, invoice.status);
    println!("  Project: {}", invoice.project_id);
    println!("  Due:     {}", format_timestamp(&invoice.due_date));
    if let Some(paid_at) = &invoice.paid_at {
        println!("  Paid:    {}", format_timestamp(paid_at));
    }
    println!();

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Qty")]
        quantity: u32,
        #[tabled(rename = "Unit Price")]
        unit_price: String,
        #[tabled(rename = "Total")]
        total: String,
    }

    let rows: Vec<ItemRow> = invoice
        .items
        .iter()
        .map(|item| ItemRow {
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: format!("{:.2}", item.unit_price),
            total: format!("{:.2}", item.total),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
    println!(
        "Total: {}",
        format_amount(invoice.amount, &invoice.currency)
    );
}

/// Display payment history in table format
pub fn display_payments(payments: &[Payment]) {
    #[derive(Tabled)]
    struct PaymentRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Invoice")]
        invoice: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Provider")]
        provider: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Created")]
        created: String,
    }

    let rows: Vec<PaymentRow> = payments
        .iter()
        .map(|payment| PaymentRow {
            id: payment.id.clone(),
            invoice: payment.invoice_id.clone(),
            amount: format_amount(payment.amount, &payment.currency),
            provider: payment.provider.to_string(),
            status: payment.status.clone(),
            created: format_timestamp(&payment.created_at),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");
}

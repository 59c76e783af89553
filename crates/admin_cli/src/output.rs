use forms::{Notice, NoticeLevel};

/// Errors and warnings go to stderr, everything else to stdout.
pub fn print_notice(notice: &Notice) {
    let line = format!("[{}] {notice}", notice.level.label());
    match notice.level {
        NoticeLevel::Error | NoticeLevel::Warning => eprintln!("{line}"),
        NoticeLevel::Info | NoticeLevel::Success => println!("{line}"),
    }
}

/// Prints rows as left-aligned columns under `headers`.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = render_row(headers, &widths);
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&cells, &widths));
    }
    out
}

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    format!("{}\n", line.trim_end())
}

use divan::{Bencher, black_box};
use tastetest::{DiffingPipeline, HtmlDiffer, parse};

fn main() {
    divan::main();
}

/// A list-heavy page with `items` entries.
fn generate_html(items: usize) -> String {
    let mut html = String::from("<main>\n  <h1 class=\"title\">Inventory</h1>\n  <ul>\n");
    for i in 0..items {
        html.push_str(&format!(
            "    <li id=\"item-{i}\" class=\"item\"><a href=\"/items/{i}\">Item {i}</a> <span>{}</span></li>\n",
            i * 3
        ));
    }
    html.push_str("  </ul>\n  <!-- footer -->\n  <footer><p>End</p></footer>\n</main>\n");
    html
}

/// Same page with one changed attribute, one changed text and one extra item.
fn modify_html(html: &str, items: usize) -> String {
    let middle = items / 2;
    html.replacen("class=\"title\"", "class=\"heading\"", 1)
        .replacen(&format!("Item {middle}<"), "Renamed<", 1)
        .replacen("  </ul>", "    <li class=\"item\">Extra</li>\n  </ul>", 1)
}

fn bench_diff(bencher: Bencher, items: usize) {
    let control = generate_html(items);
    let test = modify_html(&control, items);
    let pipeline = DiffingPipeline::default();
    bencher.bench_local(|| {
        let control = parse(black_box(&control));
        let test = parse(black_box(&test));
        let count = HtmlDiffer::new(&pipeline).compare(&control, &test).count();
        black_box(count);
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn parse_and_diff(bencher: Bencher, items: usize) {
    bench_diff(bencher, items);
}

// Trees are parsed once; only the walk is measured
#[divan::bench(args = [10, 100, 1000])]
fn diff_only(bencher: Bencher, items: usize) {
    let control = parse(&generate_html(items));
    let test = parse(&modify_html(&generate_html(items), items));
    let pipeline = DiffingPipeline::default();
    bencher.bench_local(|| {
        let count = HtmlDiffer::new(&pipeline)
            .compare(black_box(&control), black_box(&test))
            .count();
        black_box(count);
    });
}

// Consumers that stop at the first diff only pay for the walk up to it
#[divan::bench(args = [100, 1000])]
fn first_diff(bencher: Bencher, items: usize) {
    let control = parse(&generate_html(items));
    let test = parse(&modify_html(&generate_html(items), items));
    let pipeline = DiffingPipeline::default();
    bencher.bench_local(|| {
        let first = HtmlDiffer::new(&pipeline)
            .compare(black_box(&control), black_box(&test))
            .next()
            .map(|diff| diff.path().len());
        black_box(first);
    });
}

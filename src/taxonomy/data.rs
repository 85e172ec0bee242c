//! Static country/city/neighborhood dataset used to seed the taxonomy table.

pub struct NeighborhoodData {
    pub label: &'static str,
    pub value: &'static str,
}

pub struct CityData {
    pub label: &'static str,
    pub value: &'static str,
    pub neighborhoods: &'static [NeighborhoodData],
}

pub struct CountryData {
    pub code: &'static str,
    pub label: &'static str,
    pub cities: &'static [CityData],
}

macro_rules! neighborhoods {
    ($(($label:expr, $value:expr)),* $(,)?) => {
        &[$(NeighborhoodData { label: $label, value: $value }),*]
    };
}

const BOGOTA: CityData = CityData {
    label: "Bogotá",
    value: "bogota",
    neighborhoods: neighborhoods![
        ("Chapinero", "chapinero"),
        ("Usaquén", "usaquen"),
        ("La Candelaria", "la-candelaria"),
        ("Teusaquillo", "teusaquillo"),
        ("Santa Fe", "santa-fe"),
        ("Barrios Unidos", "barrios-unidos"),
        ("Suba", "suba"),
        ("Fontibón", "fontibon"),
    ],
};

const MEDELLIN: CityData = CityData {
    label: "Medellín",
    value: "medellin",
    neighborhoods: neighborhoods![
        ("El Poblado", "el-poblado"),
        ("Laureles", "laureles"),
        ("Belén", "belen"),
        ("La Candelaria", "la-candelaria"),
        ("La América", "la-america"),
        ("Buenos Aires", "buenos-aires"),
        ("Robledo", "robledo"),
    ],
};

const LIMA: CityData = CityData {
    label: "Lima",
    value: "lima",
    neighborhoods: neighborhoods![
        ("Miraflores", "miraflores"),
        ("Barranco", "barranco"),
        ("San Isidro", "san-isidro"),
        ("Santiago de Surco", "santiago-de-surco"),
        ("Jesús María", "jesus-maria"),
        ("Lince", "lince"),
        ("Magdalena del Mar", "magdalena-del-mar"),
        ("Cercado de Lima", "cercado-de-lima"),
    ],
};

const CUSCO: CityData = CityData {
    label: "Cusco",
    value: "cusco",
    neighborhoods: neighborhoods![
        ("Centro Histórico", "centro-historico"),
        ("San Blas", "san-blas"),
        ("San Cristóbal", "san-cristobal"),
        ("Wanchaq", "wanchaq"),
        ("Santiago", "santiago"),
        ("San Sebastián", "san-sebastian"),
    ],
};

pub const COLOMBIA: CountryData = CountryData {
    code: "colombia",
    label: "Colombia",
    cities: &[BOGOTA, MEDELLIN],
};

pub const PERU: CountryData = CountryData {
    code: "peru",
    label: "Peru",
    cities: &[LIMA, CUSCO],
};

pub const COUNTRIES: &[CountryData] = &[COLOMBIA, PERU];
